use std::collections::HashMap;

use eframe::egui::Color32;

use crate::color::ColorMap;
use crate::data::model::{AssociationSeries, ProcessedResult};

// ---------------------------------------------------------------------------
// Manhattan plot
// ---------------------------------------------------------------------------

/// Points of one subclass, drawn as one legend entry.
#[derive(Debug, Clone)]
pub struct SubclassGroup {
    pub subclass: String,
    pub color: Color32,
    /// `[position, lod]` pairs.
    pub points: Vec<[f64; 2]>,
    /// Index into the series for each entry of `points`.
    pub indices: Vec<usize>,
}

#[derive(Debug, Clone)]
pub struct ManhattanView {
    pub groups: Vec<SubclassGroup>,
    /// Power of ten (a multiple of 3) the x axis is scaled by.
    pub exponent: i32,
}

impl ManhattanView {
    pub fn new(series: &AssociationSeries, colors: &ColorMap) -> Self {
        let mut groups: Vec<SubclassGroup> = Vec::new();
        for (i, point) in series.iter().enumerate() {
            let idx = match groups.iter().position(|g| g.subclass == point.subclass) {
                Some(idx) => idx,
                None => {
                    groups.push(SubclassGroup {
                        subclass: point.subclass.clone(),
                        color: colors.color_for(&point.subclass),
                        points: Vec::new(),
                        indices: Vec::new(),
                    });
                    groups.len() - 1
                }
            };
            groups[idx].points.push([point.position, point.lod]);
            groups[idx].indices.push(i);
        }

        ManhattanView {
            groups,
            exponent: position_exponent(series),
        }
    }

    pub fn axis_label(&self) -> String {
        format!("Genomic Position (10^{})", self.exponent)
    }
}

/// Tick label for a raw position on an axis scaled by `10^exponent`.
pub fn format_tick(exponent: i32, position: f64) -> String {
    let scaled = position / 10f64.powi(exponent);
    if scaled.fract() == 0.0 {
        format!("{scaled}")
    } else {
        format!("{scaled:.2}")
    }
}

/// `floor(log10(min position) / 3) * 3`, or 0 without a positive position.
pub fn position_exponent(series: &AssociationSeries) -> i32 {
    let min = series
        .iter()
        .map(|p| p.position)
        .filter(|p| *p > 0.0)
        .fold(f64::INFINITY, f64::min);
    if !min.is_finite() {
        return 0;
    }
    ((min.log10() / 3.0).floor() * 3.0) as i32
}

/// Series index of the point closest to `target`, measured in screen units
/// by `to_screen`, if it lies within `radius`.
pub fn nearest_point(
    view: &ManhattanView,
    target: [f32; 2],
    radius: f32,
    to_screen: impl Fn([f64; 2]) -> [f32; 2],
) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for group in &view.groups {
        for (point, &index) in group.points.iter().zip(&group.indices) {
            let [sx, sy] = to_screen(*point);
            let dist = ((sx - target[0]).powi(2) + (sy - target[1]).powi(2)).sqrt();
            if dist <= radius && best.map_or(true, |(_, d)| dist < d) {
                best = Some((index, dist));
            }
        }
    }
    best.map(|(index, _)| index)
}

// ---------------------------------------------------------------------------
// Network
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct GraphNodeView {
    pub id: String,
    pub name: String,
    pub color: Color32,
}

#[derive(Debug, Clone)]
pub struct NetworkView {
    pub nodes: Vec<GraphNodeView>,
    /// Edges as indices into `nodes`.
    pub links: Vec<(usize, usize)>,
}

impl NetworkView {
    pub fn new(result: &ProcessedResult, colors: &ColorMap) -> Self {
        let nodes: Vec<GraphNodeView> = result
            .graph
            .nodes
            .iter()
            .map(|n| GraphNodeView {
                id: n.id.clone(),
                name: n.name.clone(),
                color: colors.color_for(&n.subclass),
            })
            .collect();

        let links = {
            let index: HashMap<&str, usize> = nodes
                .iter()
                .enumerate()
                .map(|(i, n)| (n.id.as_str(), i))
                .collect();
            result
                .graph
                .edges
                .iter()
                .filter_map(|e| Some((*index.get(e.source.as_str())?, *index.get(e.target.as_str())?)))
                .collect()
        };

        NetworkView { nodes, links }
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n.id == id)
    }
}

// ---------------------------------------------------------------------------
// Both views for one result
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct DashboardView {
    pub colors: ColorMap,
    pub manhattan: ManhattanView,
    pub network: NetworkView,
}

impl DashboardView {
    pub fn new(result: &ProcessedResult) -> Self {
        let colors = ColorMap::for_result(result);
        DashboardView {
            manhattan: ManhattanView::new(&result.series, &colors),
            network: NetworkView::new(result, &colors),
            colors,
        }
    }
}
