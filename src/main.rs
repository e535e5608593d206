mod app;
mod color;
mod config;
mod data;
mod layout;
mod state;
mod ui;
mod view;

use app::MetaboDashApp;
use config::ViewConfig;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let config = ViewConfig::default();
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(config.window_size)
            .with_min_inner_size(config.min_window_size)
            .with_drag_and_drop(true),
        ..Default::default()
    };

    eframe::run_native(
        "Metabolomics Dashboard",
        options,
        Box::new(|_cc| Ok(Box::new(MetaboDashApp::default()))),
    )
}
