use eframe::egui::{Pos2, Vec2};

/// Side of the square the layout is computed in, in world units.
const AREA_SIDE: f32 = 1_000.0;

/// Fruchterman–Reingold placement for the correlation network.
///
/// Initial positions are on a circle in node order, so the same graph always
/// produces the same picture.
#[derive(Debug, Clone)]
pub struct ForceLayout {
    pub positions: Vec<Vec2>,
}

impl ForceLayout {
    pub fn new(node_count: usize, links: &[(usize, usize)], iterations: usize) -> Self {
        let mut layout = ForceLayout {
            positions: initial_positions(node_count),
        };
        layout.run(links, iterations);
        layout.recenter();
        layout
    }

    fn run(&mut self, links: &[(usize, usize)], iterations: usize) {
        let n = self.positions.len();
        if n < 2 {
            return;
        }
        let k = (AREA_SIDE * AREA_SIDE / n as f32).sqrt();
        let mut disp = vec![Vec2::ZERO; n];

        for iter in 0..iterations {
            disp.iter_mut().for_each(|d| *d = Vec2::ZERO);

            // Repulsion between every pair.
            for i in 0..n {
                for j in (i + 1)..n {
                    let delta = self.positions[i] - self.positions[j];
                    let dist = delta.length().max(1.0);
                    let force = k * k / dist;
                    let direction = delta / dist;
                    disp[i] += direction * force;
                    disp[j] -= direction * force;
                }
            }

            // Attraction along edges; self-loops pull on nothing.
            for &(a, b) in links {
                if a == b || a >= n || b >= n {
                    continue;
                }
                let delta = self.positions[a] - self.positions[b];
                let dist = delta.length().max(1.0);
                let force = dist * dist / k;
                let direction = delta / dist;
                disp[a] -= direction * force;
                disp[b] += direction * force;
            }

            // Cooling schedule bounds the step per iteration.
            let temperature = AREA_SIDE / 10.0 * (1.0 - iter as f32 / iterations as f32);
            for (pos, d) in self.positions.iter_mut().zip(&disp) {
                let length = d.length().max(1.0);
                *pos += *d / length * length.min(temperature);
            }
        }
    }

    /// Shift so the bounding box is centred on the origin.
    fn recenter(&mut self) {
        let (min, max) = self.bounds();
        let center = (min + max) / 2.0;
        for pos in &mut self.positions {
            *pos -= center;
        }
    }

    /// `(min, max)` corners; both zero for an empty layout.
    pub fn bounds(&self) -> (Vec2, Vec2) {
        if self.positions.is_empty() {
            return (Vec2::ZERO, Vec2::ZERO);
        }
        self.positions.iter().fold(
            (Vec2::splat(f32::INFINITY), Vec2::splat(f32::NEG_INFINITY)),
            |(min, max), p| (min.min(*p), max.max(*p)),
        )
    }

    /// Index of the node closest to `world`, within `radius` world units.
    pub fn node_at(&self, world: Vec2, radius: f32) -> Option<usize> {
        self.positions
            .iter()
            .enumerate()
            .map(|(i, p)| (i, (*p - world).length()))
            .filter(|(_, d)| *d <= radius)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
    }
}

// ---------------------------------------------------------------------------
// Camera: world ↔ screen
// ---------------------------------------------------------------------------

/// View onto the layout: `focus` is the world point drawn at the viewport
/// centre, `zoom` is screen pixels per world unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub focus: Vec2,
    pub zoom: f32,
    /// Zoom that fits the whole layout; focus zoom is relative to it.
    pub fit_zoom: f32,
}

impl Camera {
    const MIN_ZOOM: f32 = 0.01;
    const MAX_ZOOM: f32 = 50.0;

    /// Centre the layout and scale it to fill `viewport` minus `margin`.
    pub fn fit(layout: &ForceLayout, viewport: Vec2, margin: f32) -> Self {
        let (min, max) = layout.bounds();
        let extent = (max - min).max_elem();
        let available = (viewport.min_elem() - 2.0 * margin).max(1.0);
        let zoom = if extent > 0.0 { available / extent } else { 1.0 };
        Camera {
            focus: (min + max) / 2.0,
            zoom,
            fit_zoom: zoom,
        }
    }

    pub fn to_screen(&self, world: Vec2, center: Pos2) -> Pos2 {
        center + (world - self.focus) * self.zoom
    }

    pub fn to_world(&self, screen: Pos2, center: Pos2) -> Vec2 {
        (screen - center) / self.zoom + self.focus
    }

    /// Move the view by a screen-space drag.
    pub fn pan(&mut self, screen_delta: Vec2) {
        self.focus -= screen_delta / self.zoom;
    }

    pub fn zoom_by(&mut self, factor: f32) {
        self.zoom = (self.zoom * factor).clamp(
            self.fit_zoom * Self::MIN_ZOOM,
            self.fit_zoom * Self::MAX_ZOOM,
        );
    }

    /// Centre on `world` at `relative_zoom` times the fitted zoom.
    pub fn focus_on(&mut self, world: Vec2, relative_zoom: f32) {
        self.focus = world;
        self.zoom = self.fit_zoom * relative_zoom;
    }
}

fn initial_positions(n: usize) -> Vec<Vec2> {
    let radius = AREA_SIDE / 2.0;
    let step = if n == 0 {
        0.0
    } else {
        std::f32::consts::TAU / n as f32
    };
    (0..n)
        .map(|i| {
            let angle = i as f32 * step;
            Vec2::new(radius * angle.cos(), radius * angle.sin())
        })
        .collect()
}
