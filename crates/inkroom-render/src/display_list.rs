//! Recording painter.

use inkroom_core::stroke::StrokeColor;
use kurbo::{Point, Rect, Size};

use crate::renderer::Painter;

/// One recorded drawing operation.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear {
        size: Size,
    },
    FillRect {
        rect: Rect,
        color: StrokeColor,
    },
    StrokeLine {
        from: Point,
        to: Point,
        color: StrokeColor,
        width: f64,
    },
    StrokePolyline {
        points: Vec<Point>,
        color: StrokeColor,
        width: f64,
    },
}

/// Painter that records commands instead of rasterizing them.
///
/// Two lists compare equal when the frames they describe are identical,
/// which makes the rendered output observable in tests and headless runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayList {
    commands: Vec<DrawCommand>,
}

impl DisplayList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands of the current frame, in drawing order.
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Surface size of the current frame, if one was started.
    pub fn size(&self) -> Option<Size> {
        match self.commands.first() {
            Some(DrawCommand::Clear { size }) => Some(*size),
            _ => None,
        }
    }

    /// Polylines of the current frame, ignoring the background.
    pub fn polylines(&self) -> impl Iterator<Item = &[Point]> {
        self.commands.iter().filter_map(|command| match command {
            DrawCommand::StrokePolyline { points, .. } => Some(points.as_slice()),
            _ => None,
        })
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl Painter for DisplayList {
    fn clear(&mut self, size: Size) {
        self.commands.clear();
        self.commands.push(DrawCommand::Clear { size });
    }

    fn fill_rect(&mut self, rect: Rect, color: StrokeColor) {
        self.commands.push(DrawCommand::FillRect { rect, color });
    }

    fn stroke_line(&mut self, from: Point, to: Point, color: StrokeColor, width: f64) {
        self.commands.push(DrawCommand::StrokeLine {
            from,
            to,
            color,
            width,
        });
    }

    fn stroke_polyline(&mut self, points: &[Point], color: StrokeColor, width: f64) {
        self.commands.push(DrawCommand::StrokePolyline {
            points: points.to_vec(),
            color,
            width,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_starts_new_frame() {
        let mut list = DisplayList::new();
        assert_eq!(list.size(), None);

        list.stroke_polyline(&[Point::new(1.0, 1.0)], StrokeColor::black(), 2.0);
        list.clear(Size::new(10.0, 20.0));
        assert_eq!(list.len(), 1);
        assert_eq!(list.size(), Some(Size::new(10.0, 20.0)));
        assert_eq!(list.polylines().count(), 0);
    }

    #[test]
    fn test_polylines_skip_background() {
        let mut list = DisplayList::new();
        list.clear(Size::new(10.0, 10.0));
        list.fill_rect(Rect::new(0.0, 0.0, 10.0, 10.0), StrokeColor::black());
        list.stroke_line(Point::ZERO, Point::new(10.0, 0.0), StrokeColor::black(), 1.0);
        list.stroke_polyline(&[Point::new(2.0, 3.0)], StrokeColor::black(), 2.0);

        let polylines: Vec<_> = list.polylines().collect();
        assert_eq!(polylines, vec![&[Point::new(2.0, 3.0)][..]]);
    }
}
