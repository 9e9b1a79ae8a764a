//! Vello-based painter.

use inkroom_core::stroke::{Stroke, StrokeColor, polyline_path};
use kurbo::{Affine, Cap, Circle, Join, Line, Point, Rect, Size};
use peniko::{Color, Fill};
use vello::Scene;

use crate::renderer::Painter;

fn round_stroke(width: f64) -> kurbo::Stroke {
    kurbo::Stroke::new(width).with_caps(Cap::Round).with_join(Join::Round)
}

/// Painter that builds a Vello scene for GPU rendering.
pub struct VelloPainter {
    /// The Vello scene being built.
    scene: Scene,
    size: Size,
}

impl Default for VelloPainter {
    fn default() -> Self {
        Self::new()
    }
}

impl VelloPainter {
    /// Create a new Vello painter.
    pub fn new() -> Self {
        Self {
            scene: Scene::new(),
            size: Size::ZERO,
        }
    }

    /// Get the built scene for rendering.
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Take ownership of the scene (resets internal scene).
    pub fn take_scene(&mut self) -> Scene {
        std::mem::take(&mut self.scene)
    }

    /// Size of the current frame.
    pub fn size(&self) -> Size {
        self.size
    }

    /// A lone point has no segment for the caps to attach to.
    fn dot(&mut self, at: Point, color: StrokeColor, width: f64) {
        let dot = Circle::new(at, width / 2.0);
        self.scene
            .fill(Fill::NonZero, Affine::IDENTITY, Color::from(color), None, &dot);
    }
}

impl Painter for VelloPainter {
    fn clear(&mut self, size: Size) {
        self.scene.reset();
        self.size = size;
    }

    fn fill_rect(&mut self, rect: Rect, color: StrokeColor) {
        self.scene
            .fill(Fill::NonZero, Affine::IDENTITY, Color::from(color), None, &rect);
    }

    fn stroke_line(&mut self, from: Point, to: Point, color: StrokeColor, width: f64) {
        self.scene.stroke(
            &round_stroke(width),
            Affine::IDENTITY,
            Color::from(color),
            None,
            &Line::new(from, to),
        );
    }

    fn stroke_polyline(&mut self, points: &[Point], color: StrokeColor, width: f64) {
        match points {
            [] => {}
            [at] => self.dot(*at, color, width),
            _ => self.scene.stroke(
                &round_stroke(width),
                Affine::IDENTITY,
                Color::from(color),
                None,
                &polyline_path(points),
            ),
        }
    }

    fn stroke(&mut self, stroke: &Stroke) {
        if let [at] = stroke.points() {
            self.dot(*at, stroke.color(), stroke.width());
            return;
        }
        self.scene.stroke(
            &round_stroke(stroke.width()),
            Affine::IDENTITY,
            Color::from(stroke.color()),
            None,
            &stroke.to_path(),
        );
    }
}
