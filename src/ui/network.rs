use eframe::egui::{self, Align2, FontId, Sense, Stroke, Ui, Vec2};

use crate::data::model::MetaboliteDetail;
use crate::layout::Camera;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Correlation network (painter-based force graph)
// ---------------------------------------------------------------------------

/// Render the network view. Drag pans, scroll zooms, click selects a node.
pub fn network_graph(ui: &mut Ui, state: &mut AppState) {
    let (Some(view), Some(layout), Some(result)) = (&state.view, &state.layout, &state.result)
    else {
        return;
    };
    let network = &view.network;
    if network.nodes.is_empty() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.label("No correlation pairs with both metabolites present.");
        });
        return;
    }

    let config = &state.config;
    let size = ui.available_size();
    let (rect, response) = ui.allocate_exact_size(size, Sense::click_and_drag());
    let center = rect.center();

    let mut camera = state
        .camera
        .unwrap_or_else(|| Camera::fit(layout, rect.size(), config.node_radius * 3.0));

    // Centre on a newly selected metabolite once.
    if let Some(selected) = &state.selected {
        if state.camera_target.as_deref() != Some(selected.id.as_str()) {
            if let Some(index) = network.index_of(&selected.id) {
                camera.focus_on(layout.positions[index], config.focus_zoom);
            }
        }
    }

    if response.dragged() {
        camera.pan(response.drag_delta());
    }
    if response.hovered() {
        let scroll = ui.input(|i| i.smooth_scroll_delta.y);
        if scroll != 0.0 {
            camera.zoom_by((scroll * 0.005).exp());
        }
    }

    let painter = ui.painter_at(rect);
    let edge_stroke = Stroke::new(1.0, config.edge_color);

    for &(a, b) in &network.links {
        let pa = camera.to_screen(layout.positions[a], center);
        if a == b {
            let loop_center = pa - Vec2::new(0.0, config.node_radius * 1.5);
            painter.circle_stroke(loop_center, config.node_radius, edge_stroke);
        } else {
            let pb = camera.to_screen(layout.positions[b], center);
            painter.line_segment([pa, pb], edge_stroke);
        }
    }

    let selected_id = state.selected.as_ref().map(|s| s.id.as_str());
    for (node, pos) in network.nodes.iter().zip(&layout.positions) {
        let color = if selected_id == Some(node.id.as_str()) {
            config.selected_color
        } else {
            node.color
        };
        painter.circle_filled(camera.to_screen(*pos, center), config.node_radius, color);
    }

    let hovered = response.hover_pos().and_then(|pointer| {
        let world = camera.to_world(pointer, center);
        layout.node_at(world, config.node_radius / camera.zoom)
    });

    let mut clicked = None;
    if let Some(index) = hovered {
        let node = &network.nodes[index];
        let label_pos = camera.to_screen(layout.positions[index], center)
            + Vec2::new(0.0, -config.node_radius - 2.0);
        painter.text(
            label_pos,
            Align2::CENTER_BOTTOM,
            format!("{} ({})", node.id, node.name),
            FontId::proportional(13.0),
            ui.visuals().strong_text_color(),
        );
        if response.clicked() {
            clicked = result.graph.node(&node.id).map(MetaboliteDetail::from);
        }
        ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
    }

    let focused = state.selected.as_ref().map(|s| s.id.clone());
    state.camera = Some(camera);
    state.camera_target = focused;
    if let Some(detail) = clicked {
        state.select(detail);
    }
}
