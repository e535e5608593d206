use eframe::egui::{self, Align2, Color32, Rect, RichText, Stroke, Ui};

use crate::data::pipeline::Upload;
use crate::state::{AppState, Step, UploadKind};

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            for kind in UploadKind::ALL {
                if ui.button(format!("Open {}…", kind.label())).clicked() {
                    open_file_dialog(state, kind);
                    ui.close_menu();
                }
            }
            ui.separator();
            if ui
                .add_enabled(state.result.is_some(), egui::Button::new("Export JSON…"))
                .clicked()
            {
                export_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        let steps = ["1. Upload CSV Files", "2. View Interactive Plots"];
        let active = match state.step {
            Step::Upload => 0,
            Step::Visualize => 1,
        };
        for (i, label) in steps.iter().enumerate() {
            let text = RichText::new(*label);
            ui.label(if i == active { text.strong() } else { text.weak() });
        }

        ui.separator();

        if let Some(result) = &state.result {
            ui.label(format!(
                "{} metabolites, {} nodes, {} edges, {} GWAS points",
                result.registry.len(),
                result.graph.nodes.len(),
                result.graph.edges.len(),
                result.series.len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// Upload step
// ---------------------------------------------------------------------------

/// Render the three upload slots. Returns each slot's screen rect so dropped
/// files can be routed to the slot under the pointer.
pub fn upload_step(ui: &mut Ui, state: &mut AppState) -> Vec<(UploadKind, Rect)> {
    ui.heading("Upload Dataset Files");
    ui.label("Please upload the following CSV files to continue:");
    ui.add_space(8.0);

    let hovering_files = ui.ctx().input(|i| !i.raw.hovered_files.is_empty());
    let pointer = ui.ctx().input(|i| i.pointer.latest_pos());
    let mut rects = Vec::with_capacity(UploadKind::ALL.len());

    ui.columns(UploadKind::ALL.len(), |columns: &mut [Ui]| {
        for (ui, kind) in columns.iter_mut().zip(UploadKind::ALL) {
            let frame = egui::Frame::group(ui.style()).show(ui, |ui: &mut Ui| {
                ui.set_min_height(180.0);
                ui.strong(kind.label());
                ui.label(RichText::new(kind.description()).weak());
                ui.add_space(6.0);

                let chosen = state.uploads.get(kind).cloned();
                match &chosen {
                    Some(file) => {
                        ui.label(RichText::new(format!("✔ {}", file.file_name())).color(Color32::GREEN));
                        ui.label(format!("Size: {:.2} KB", file.size_kb()));
                    }
                    None => {
                        let (zone, _) = ui.allocate_exact_size(
                            egui::vec2(ui.available_width(), 80.0),
                            egui::Sense::hover(),
                        );
                        let over = hovering_files && pointer.is_some_and(|p| zone.contains(p));
                        let stroke_color = if over { Color32::from_rgb(76, 175, 80) } else { Color32::GRAY };
                        ui.painter().rect_stroke(
                            zone,
                            4.0,
                            Stroke::new(2.0, stroke_color),
                            egui::StrokeKind::Inside,
                        );
                        ui.painter().text(
                            zone.center(),
                            Align2::CENTER_CENTER,
                            if over {
                                "Drop to upload"
                            } else {
                                "Drag and drop CSV file here or click Upload File"
                            },
                            egui::FontId::proportional(12.0),
                            ui.visuals().weak_text_color(),
                        );
                    }
                }

                ui.add_space(6.0);
                let button = if chosen.is_some() { "Change File" } else { "Upload File" };
                if ui.button(button).clicked() {
                    open_file_dialog(state, kind);
                }
            });
            rects.push((kind, frame.response.rect));
        }
    });

    ui.add_space(12.0);
    ui.label(
        RichText::new(
            "Note: All files must be in CSV format. Files can be uploaded using the \
             button or by dragging and dropping directly onto the upload area.",
        )
        .weak(),
    );

    rects
}

/// Route files dropped this frame to the slot under the pointer, or to the
/// first empty slot when the pointer position is unknown.
pub fn handle_dropped_files(ctx: &egui::Context, state: &mut AppState, slots: &[(UploadKind, Rect)]) {
    let (dropped, pointer): (Vec<Upload>, _) = ctx.input(|i| {
        (
            i.raw.dropped_files.iter().filter_map(dropped_upload).collect(),
            i.pointer.latest_pos(),
        )
    });

    for upload in dropped {
        let target = pointer
            .and_then(|p| slots.iter().find(|(_, rect)| rect.contains(p)).map(|(k, _)| *k))
            .or_else(|| {
                UploadKind::ALL
                    .into_iter()
                    .find(|k| state.uploads.get(*k).is_none())
            });
        let Some(kind) = target else {
            state.status_message = Some("Drop the file onto one of the upload areas".to_string());
            continue;
        };
        let name = upload.name();
        if let Err(e) = state.set_upload(kind, upload) {
            log::error!("Rejected {name}: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}

/// Native drops carry a path; some platforms only deliver the bytes.
fn dropped_upload(file: &egui::DroppedFile) -> Option<Upload> {
    if let Some(path) = &file.path {
        return Some(Upload::Path(path.clone()));
    }
    file.bytes.as_ref().map(|bytes| Upload::Memory {
        name: file.name.clone(),
        content: bytes.to_vec(),
    })
}

// ---------------------------------------------------------------------------
// Navigation
// ---------------------------------------------------------------------------

/// Back / Next buttons plus run progress.
pub fn nav_bar(ui: &mut Ui, state: &mut AppState) {
    ui.horizontal(|ui: &mut Ui| {
        if ui
            .add_enabled(state.step == Step::Visualize, egui::Button::new("Back"))
            .clicked()
        {
            state.go_back();
        }

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui: &mut Ui| {
            let can_advance = state.step == Step::Upload && !state.is_processing();
            if ui.add_enabled(can_advance, egui::Button::new("Next")).clicked() {
                if let Err(e) = state.start_processing() {
                    state.status_message = Some(format!("{e:#}"));
                }
            }
            if state.is_processing() {
                ui.label(format!("{}…", state.stage));
                ui.spinner();
            }
        });
    });
}

// ---------------------------------------------------------------------------
// Details window
// ---------------------------------------------------------------------------

pub fn details_window(ctx: &egui::Context, state: &mut AppState) {
    if !state.details_open {
        return;
    }
    let Some(detail) = state.selected.clone() else {
        return;
    };

    let mut close = false;
    egui::Window::new("Metabolite Details")
        .collapsible(false)
        .resizable(false)
        .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui: &mut Ui| {
            egui::Grid::new("metabolite_details")
                .num_columns(2)
                .spacing([12.0, 6.0])
                .show(ui, |ui: &mut Ui| {
                    let not_specified = || "Not specified".to_string();
                    let mut row = |label: &str, value: String| {
                        ui.strong(label);
                        ui.label(value);
                        ui.end_row();
                    };
                    row("ID:", detail.id.clone());
                    row(
                        "Name:",
                        Some(detail.name.clone())
                            .filter(|n| !n.is_empty())
                            .unwrap_or_else(not_specified),
                    );
                    row(
                        "Subclass:",
                        detail
                            .subclass
                            .clone()
                            .filter(|s| !s.is_empty())
                            .unwrap_or_else(not_specified),
                    );
                    if let Some(snp) = detail.snp.clone().filter(|s| !s.is_empty()) {
                        row("SNP:", snp);
                    }
                    if let Some(position) = detail.position {
                        row("Position:", position.to_string());
                    }
                    if let Some(lod) = detail.lod {
                        row("LOD Score:", format!("{lod:.2}"));
                    }
                });
            ui.add_space(8.0);
            if ui.button("Close").clicked() {
                close = true;
            }
        });

    if close {
        state.close_details();
    }
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState, kind: UploadKind) {
    let file = rfd::FileDialog::new()
        .set_title(kind.label())
        .add_filter("CSV", &["csv"])
        .pick_file();

    if let Some(path) = file {
        if let Err(e) = state.set_upload(kind, Upload::Path(path)) {
            log::error!("Failed to select file: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}

fn export_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Export processed data")
        .add_filter("JSON", &["json"])
        .set_file_name("metabolomics.json")
        .save_file();

    if let Some(path) = file {
        match state.export_json(&path) {
            Ok(()) => state.status_message = None,
            Err(e) => {
                log::error!("Failed to export: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}
