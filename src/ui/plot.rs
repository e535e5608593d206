use eframe::egui::{self, Color32, RichText, Ui};
use egui_plot::{Corner, Legend, MarkerShape, Plot, PlotPoint, PlotPoints, Points};

use crate::data::model::{AssociationPoint, MetaboliteDetail};
use crate::state::AppState;
use crate::view::{format_tick, nearest_point};

// ---------------------------------------------------------------------------
// Manhattan plot
// ---------------------------------------------------------------------------

/// Render the GWAS scatter plot. Clicking a point selects its metabolite.
pub fn manhattan_plot(ui: &mut Ui, state: &mut AppState, reset_zoom: bool) {
    let (Some(view), Some(result)) = (&state.view, &state.result) else {
        return;
    };
    if result.series.is_empty() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.label("No GWAS rows with a non-zero position and LOD score.");
        });
        return;
    }

    let manhattan = &view.manhattan;
    let exponent = manhattan.exponent;
    let point_radius = state.config.point_radius;
    let hover_radius = state.config.point_hover_radius;
    let selected_color = state.config.selected_color;
    let selected_id = state.selected.as_ref().map(|s| s.id.clone());

    let mut plot = Plot::new("manhattan_plot")
        .legend(Legend::default().position(Corner::RightTop))
        .x_axis_label(manhattan.axis_label())
        .y_axis_label("LOD Score")
        .x_axis_formatter(move |mark, _range| format_tick(exponent, mark.value))
        .show_x(false)
        .show_y(false)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true);
    if reset_zoom {
        plot = plot.reset();
    }

    let response = plot.show(ui, |plot_ui| {
        for group in &manhattan.groups {
            let points = Points::new(PlotPoints::from(group.points.clone()))
                .name(&group.subclass)
                .color(group.color)
                .shape(MarkerShape::Circle)
                .filled(true)
                .radius(point_radius);
            plot_ui.points(points);
        }

        // Outline points of the selected metabolite.
        if let Some(id) = &selected_id {
            let marked: Vec<[f64; 2]> = result
                .series
                .iter()
                .filter(|p| &p.id == id)
                .map(|p| [p.position, p.lod])
                .collect();
            if !marked.is_empty() {
                plot_ui.points(
                    Points::new(PlotPoints::from(marked))
                        .color(selected_color)
                        .filled(false)
                        .radius(hover_radius),
                );
            }
        }
    });

    let transform = response.transform;
    let to_screen = |p: [f64; 2]| {
        let pos = transform.position_from_point(&PlotPoint::new(p[0], p[1]));
        [pos.x, pos.y]
    };

    let hovered = response
        .response
        .hover_pos()
        .and_then(|pos| nearest_point(manhattan, [pos.x, pos.y], hover_radius + 2.0, to_screen));

    let mut clicked = None;
    if let Some(index) = hovered {
        let point = &result.series[index];
        if response.response.clicked() {
            clicked = Some(MetaboliteDetail::from(point));
        }
        let group_color = view.colors.color_for(&point.subclass);
        response
            .response
            .on_hover_ui_at_pointer(|ui: &mut Ui| point_tooltip(ui, point, group_color));
    }

    if let Some(detail) = clicked {
        state.select(detail);
    }
}

fn point_tooltip(ui: &mut Ui, point: &AssociationPoint, color: Color32) {
    ui.label(RichText::new("Metabolite:").strong().color(color));
    egui::Grid::new("manhattan_tooltip")
        .num_columns(2)
        .show(ui, |ui: &mut Ui| {
            let rows = [
                ("ID", point.id.clone()),
                ("Name", point.name.clone()),
                ("LOD", format!("{:.2}", point.lod)),
                ("Position", point.position.to_string()),
                ("SNP", point.snp.clone()),
                ("Subclass", point.subclass.clone()),
            ];
            for (label, value) in rows {
                ui.label(format!("{label}:"));
                ui.label(value);
                ui.end_row();
            }
        });
}
