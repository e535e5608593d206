use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::Srgb;

use crate::data::model::ProcessedResult;

/// Number of distinct subclass colours before the palette wraps around.
pub const PALETTE_SIZE: usize = 22;

/// Opacity applied to every subclass colour.
pub const POINT_ALPHA: f32 = 0.7;

// ---------------------------------------------------------------------------
// Subclass palette
// ---------------------------------------------------------------------------

const SUBCLASS_COLORS: [Srgb<u8>; PALETTE_SIZE] = [
    Srgb::new(255, 99, 132),
    Srgb::new(54, 162, 235),
    Srgb::new(255, 206, 86),
    Srgb::new(75, 192, 192),
    Srgb::new(153, 102, 255),
    Srgb::new(255, 159, 64),
    Srgb::new(199, 199, 199),
    Srgb::new(83, 102, 255),
    Srgb::new(255, 99, 255),
    Srgb::new(0, 162, 172),
    Srgb::new(0, 0, 0),
    Srgb::new(103, 242, 100),
    Srgb::new(173, 216, 230),
    Srgb::new(216, 174, 173),
    Srgb::new(230, 185, 216),
    Srgb::new(141, 216, 173),
    Srgb::new(173, 216, 141),
    Srgb::new(185, 230, 216),
    Srgb::new(216, 141, 173),
    Srgb::new(141, 185, 230),
    Srgb::new(230, 141, 216),
    Srgb::new(216, 230, 173),
];

/// The fixed subclass palette at [`POINT_ALPHA`] opacity.
pub fn subclass_palette() -> Vec<Color32> {
    let alpha = (POINT_ALPHA * 255.0).round() as u8;
    SUBCLASS_COLORS
        .iter()
        .map(|c| Color32::from_rgba_unmultiplied(c.red, c.green, c.blue, alpha))
        .collect()
}

// ---------------------------------------------------------------------------
// Subclass → Color32
// ---------------------------------------------------------------------------

/// Maps subclass labels to palette colours by first-occurrence order:
/// the i-th distinct subclass gets `palette[i % PALETTE_SIZE]`.
#[derive(Debug, Clone)]
pub struct ColorMap {
    mapping: BTreeMap<String, Color32>,
    /// Subclasses in the order they were assigned.
    order: Vec<String>,
    default_color: Color32,
}

impl ColorMap {
    /// Build from subclass labels in encounter order; repeats are ignored.
    pub fn new<'a>(subclasses: impl IntoIterator<Item = &'a str>) -> Self {
        let palette = subclass_palette();
        let mut mapping = BTreeMap::new();
        let mut order = Vec::new();

        for subclass in subclasses {
            if mapping.contains_key(subclass) {
                continue;
            }
            mapping.insert(subclass.to_string(), palette[order.len() % PALETTE_SIZE]);
            order.push(subclass.to_string());
        }

        ColorMap {
            mapping,
            order,
            default_color: Color32::GRAY,
        }
    }

    /// Colours shared by both views: series subclasses first, then any the
    /// network adds.
    pub fn for_result(result: &ProcessedResult) -> Self {
        ColorMap::new(
            result
                .series
                .iter()
                .map(|p| p.subclass.as_str())
                .chain(result.graph.nodes.iter().map(|n| n.subclass.as_str())),
        )
    }

    /// Look up the colour for a subclass.
    pub fn color_for(&self, subclass: &str) -> Color32 {
        self.mapping
            .get(subclass)
            .copied()
            .unwrap_or(self.default_color)
    }

    /// Return the legend entries (subclass → colour) in assignment order.
    pub fn legend_entries(&self) -> Vec<(String, Color32)> {
        self.order
            .iter()
            .map(|s| (s.clone(), self.color_for(s)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{AssociationPoint, NetworkNode};

    #[test]
    fn test_palette_colors_distinct() {
        let palette = subclass_palette();
        assert_eq!(palette.len(), PALETTE_SIZE);
        for (i, a) in palette.iter().enumerate() {
            for b in &palette[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert_eq!(palette[0], Color32::from_rgba_unmultiplied(255, 99, 132, 179));
        assert_eq!(palette[PALETTE_SIZE - 1], Color32::from_rgba_unmultiplied(216, 230, 173, 179));
    }

    #[test]
    fn test_first_occurrence_order() {
        let palette = subclass_palette();
        let map = ColorMap::new(["Lipid", "Amino", "Lipid", "Unknown"]);
        assert_eq!(map.color_for("Lipid"), palette[0]);
        assert_eq!(map.color_for("Amino"), palette[1]);
        assert_eq!(map.color_for("Unknown"), palette[2]);
        assert_eq!(map.color_for("never seen"), Color32::GRAY);
        let legend: Vec<String> = map.legend_entries().into_iter().map(|(s, _)| s).collect();
        assert_eq!(legend, vec!["Lipid", "Amino", "Unknown"]);
    }

    #[test]
    fn test_palette_wraps_modulo_size() {
        let names: Vec<String> = (0..PALETTE_SIZE + 1).map(|i| format!("S{i}")).collect();
        let map = ColorMap::new(names.iter().map(|s| s.as_str()));
        assert_eq!(map.color_for("S0"), map.color_for(&format!("S{PALETTE_SIZE}")));
        assert_ne!(map.color_for("S0"), map.color_for("S1"));
    }

    #[test]
    fn test_result_colors_series_before_network() {
        let mut result = ProcessedResult::default();
        result.graph.nodes.push(NetworkNode {
            id: "M1".into(),
            name: "Alpha".into(),
            subclass: "Lipid".into(),
        });
        result.series.push(AssociationPoint {
            id: "M2".into(),
            name: "Beta".into(),
            subclass: "Amino".into(),
            snp: "rs1".into(),
            position: 1.0,
            lod: 1.0,
        });
        let palette = subclass_palette();
        let map = ColorMap::for_result(&result);
        assert_eq!(map.color_for("Amino"), palette[0]);
        assert_eq!(map.color_for("Lipid"), palette[1]);
    }
}
