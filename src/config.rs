use eframe::egui::Color32;

/// Presentation constants shared by `main` and the UI.
#[derive(Debug, Clone)]
pub struct ViewConfig {
    pub window_size: [f32; 2],
    pub min_window_size: [f32; 2],
    /// Manhattan plot marker radius, and the radius used while hovered.
    pub point_radius: f32,
    pub point_hover_radius: f32,
    /// Network node radius in screen pixels at zoom 1.
    pub node_radius: f32,
    pub edge_color: Color32,
    pub selected_color: Color32,
    /// Force-directed layout iterations run once per new graph.
    pub layout_iterations: usize,
    /// Zoom applied when centring the network on a selected node.
    pub focus_zoom: f32,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            window_size: [1280.0, 820.0],
            min_window_size: [720.0, 480.0],
            point_radius: 4.0,
            point_hover_radius: 6.0,
            node_radius: 6.0,
            edge_color: Color32::from_rgba_unmultiplied(160, 160, 160, 90),
            selected_color: Color32::from_rgb(255, 0, 0),
            layout_iterations: 300,
            focus_zoom: 2.0,
        }
    }
}
