use eframe::egui;

use crate::state::{AppState, Step};
use crate::ui::{network, panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MetaboDashApp {
    pub state: AppState,
}

impl eframe::App for MetaboDashApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.state.poll();
        if self.state.is_processing() {
            ctx.request_repaint_after(std::time::Duration::from_millis(50));
        }

        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Bottom panel: Back / Next ----
        egui::TopBottomPanel::bottom("nav_bar").show(ctx, |ui| {
            ui.add_space(4.0);
            panels::nav_bar(ui, &mut self.state);
            ui.add_space(4.0);
        });

        // ---- Central panel: upload slots or the two charts ----
        egui::CentralPanel::default().show(ctx, |ui| match self.state.step {
            Step::Upload => {
                let slots = panels::upload_step(ui, &mut self.state);
                panels::handle_dropped_files(ctx, &mut self.state, &slots);
            }
            Step::Visualize => visualize_step(ui, &mut self.state),
        });

        panels::details_window(ctx, &mut self.state);
    }
}

fn visualize_step(ui: &mut egui::Ui, state: &mut AppState) {
    ui.heading("Interactive Metabolomics Visualization");
    ui.add_space(4.0);

    ui.columns(2, |columns| {
        let (left, right) = columns.split_at_mut(1);

        let ui = &mut left[0];
        let reset_zoom = ui
            .horizontal(|ui| {
                ui.strong("Manhattan Plot (GWAS Data)");
                ui.small_button("Reset Zoom").clicked()
            })
            .inner;
        ui.label(egui::RichText::new("Legend: Metabolite Subclasses").weak());
        plot::manhattan_plot(ui, state, reset_zoom);

        let ui = &mut right[0];
        ui.strong("Metabolite Correlation Network");
        subclass_legend(ui, state);
        egui::Frame::canvas(ui.style()).show(ui, |ui| {
            network::network_graph(ui, state);
        });
    });
}

fn subclass_legend(ui: &mut egui::Ui, state: &AppState) {
    let Some(view) = &state.view else {
        return;
    };
    ui.horizontal_wrapped(|ui| {
        for (subclass, color) in view.colors.legend_entries() {
            let (rect, _) = ui.allocate_exact_size(egui::vec2(10.0, 10.0), egui::Sense::hover());
            ui.painter().circle_filled(rect.center(), 4.0, color);
            ui.small(subclass);
        }
    });
}
