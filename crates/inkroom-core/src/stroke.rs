//! Strokes: one continuous drawn path plus the styling it was drawn with.

use std::fmt;
use std::str::FromStr;

use kurbo::{BezPath, Point, Rect};
use peniko::Color;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when building a stroke or parsing its color.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StrokeError {
    #[error("stroke has no points")]
    Empty,
    #[error("stroke width must be positive and finite, got {0}")]
    InvalidWidth(f64),
    #[error("invalid color value: {0:?}")]
    InvalidColor(String),
}

/// Stroke color (RGBA8). Travels on the wire as a CSS hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StrokeColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl StrokeColor {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn black() -> Self {
        Self::rgb(0, 0, 0)
    }
}

impl Default for StrokeColor {
    fn default() -> Self {
        Self::black()
    }
}

impl FromStr for StrokeColor {
    type Err = StrokeError;

    /// Accepts `#rgb`, `#rrggbb` and `#rrggbbaa`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || StrokeError::InvalidColor(s.to_string());
        let hex = s.trim().strip_prefix('#').ok_or_else(invalid)?;
        if !hex.is_ascii() {
            return Err(invalid());
        }
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        let nibble = |i: usize| {
            u8::from_str_radix(&hex[i..i + 1], 16)
                .map(|v| v * 17)
                .map_err(|_| invalid())
        };

        match hex.len() {
            3 => Ok(Self::rgb(nibble(0)?, nibble(1)?, nibble(2)?)),
            6 => Ok(Self::rgb(byte(0)?, byte(2)?, byte(4)?)),
            8 => Ok(Self::rgba(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for StrokeColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)?;
        if self.a != 255 {
            write!(f, "{:02x}", self.a)?;
        }
        Ok(())
    }
}

impl TryFrom<String> for StrokeColor {
    type Error = StrokeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<StrokeColor> for String {
    fn from(color: StrokeColor) -> Self {
        color.to_string()
    }
}

impl From<StrokeColor> for Color {
    fn from(color: StrokeColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Shape of a stroke as it appears in a frame, before validation.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StrokeFrame {
    user_id: String,
    color: StrokeColor,
    width: f64,
    points: Vec<Point>,
}

impl TryFrom<StrokeFrame> for Stroke {
    type Error = StrokeError;

    fn try_from(frame: StrokeFrame) -> Result<Self, Self::Error> {
        Stroke::new(frame.user_id, frame.color, frame.width, frame.points)
    }
}

/// One continuous drawn path. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StrokeFrame", rename_all = "camelCase")]
pub struct Stroke {
    #[serde(rename = "userId")]
    author_id: String,
    color: StrokeColor,
    width: f64,
    points: Vec<Point>,
}

impl Stroke {
    /// Build a stroke. Fails on an empty point list or a non-positive width.
    pub fn new(
        author_id: impl Into<String>,
        color: StrokeColor,
        width: f64,
        points: Vec<Point>,
    ) -> Result<Self, StrokeError> {
        if points.is_empty() {
            return Err(StrokeError::Empty);
        }
        if !(width.is_finite() && width > 0.0) {
            return Err(StrokeError::InvalidWidth(width));
        }
        Ok(Self {
            author_id: author_id.into(),
            color,
            width,
            points,
        })
    }

    pub fn author_id(&self) -> &str {
        &self.author_id
    }

    pub fn color(&self) -> StrokeColor {
        self.color
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    /// Captured points, never empty.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Number of points in the path.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false for a constructed stroke.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Whether the stroke was authored by `author_id`.
    pub fn is_by(&self, author_id: &str) -> bool {
        self.author_id == author_id
    }

    /// Bounding box of the captured points (zero-area for a dot).
    pub fn bounds(&self) -> Rect {
        let first = self.points[0];
        self.points
            .iter()
            .skip(1)
            .fold(Rect::from_points(first, first), |rect, p| rect.union_pt(*p))
    }

    /// Polyline through every point. See [`polyline_path`].
    pub fn to_path(&self) -> BezPath {
        polyline_path(&self.points)
    }
}

/// Move to the first point, then straight segments through the rest.
pub fn polyline_path(points: &[Point]) -> BezPath {
    let mut path = BezPath::new();
    let Some((first, rest)) = points.split_first() else {
        return path;
    };
    path.move_to(*first);
    for point in rest {
        path.line_to(*point);
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dot() -> Vec<Point> {
        vec![Point::new(3.0, 4.0)]
    }

    #[test]
    fn test_empty_stroke_rejected() {
        let result = Stroke::new("u1", StrokeColor::black(), 2.0, Vec::new());
        assert_eq!(result, Err(StrokeError::Empty));
    }

    #[test]
    fn test_invalid_width_rejected() {
        assert!(matches!(
            Stroke::new("u1", StrokeColor::black(), 0.0, dot()),
            Err(StrokeError::InvalidWidth(_))
        ));
        assert!(matches!(
            Stroke::new("u1", StrokeColor::black(), f64::NAN, dot()),
            Err(StrokeError::InvalidWidth(_))
        ));
    }

    #[test]
    fn test_single_point_is_a_dot() {
        let stroke = Stroke::new("u1", StrokeColor::black(), 2.0, dot()).unwrap();
        assert_eq!(stroke.len(), 1);
        let bounds = stroke.bounds();
        assert!((bounds.width()).abs() < f64::EPSILON);
        assert!((bounds.x0 - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_bounds() {
        let stroke = Stroke::new(
            "u1",
            StrokeColor::black(),
            2.0,
            vec![
                Point::new(0.0, 0.0),
                Point::new(100.0, 50.0),
                Point::new(50.0, 100.0),
            ],
        )
        .unwrap();

        let bounds = stroke.bounds();
        assert!((bounds.x1 - 100.0).abs() < f64::EPSILON);
        assert!((bounds.y1 - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_to_path_segments() {
        let stroke = Stroke::new(
            "u1",
            StrokeColor::black(),
            2.0,
            vec![Point::new(0.0, 0.0), Point::new(5.0, 5.0), Point::new(9.0, 1.0)],
        )
        .unwrap();
        // one move_to followed by two line_to
        assert_eq!(stroke.to_path().elements().len(), 3);
        assert!(polyline_path(&[]).elements().is_empty());
    }

    #[test]
    fn test_color_into_peniko() {
        let color: Color = StrokeColor::rgba(0x4c, 0xaf, 0x50, 0x80).into();
        assert_eq!(color, Color::from_rgba8(0x4c, 0xaf, 0x50, 0x80));
    }

    #[test]
    fn test_color_parse() {
        assert_eq!("#000000".parse::<StrokeColor>().unwrap(), StrokeColor::black());
        assert_eq!("#fff".parse::<StrokeColor>().unwrap(), StrokeColor::rgb(255, 255, 255));
        assert_eq!(
            "#ff000080".parse::<StrokeColor>().unwrap(),
            StrokeColor::rgba(255, 0, 0, 128)
        );
        assert!("red".parse::<StrokeColor>().is_err());
        assert!("#12345".parse::<StrokeColor>().is_err());
        assert!("#gg0000".parse::<StrokeColor>().is_err());
    }

    #[test]
    fn test_color_display() {
        assert_eq!(StrokeColor::rgb(0x4c, 0xaf, 0x50).to_string(), "#4caf50");
        assert_eq!(StrokeColor::rgba(0, 0, 0, 0x10).to_string(), "#00000010");
    }

    #[test]
    fn test_stroke_wire_shape() {
        let stroke = Stroke::new(
            "u1",
            StrokeColor::black(),
            2.0,
            vec![Point::new(0.0, 0.0), Point::new(5.0, 5.0)],
        )
        .unwrap();
        let json = serde_json::to_value(&stroke).unwrap();
        assert_eq!(json["userId"], "u1");
        assert_eq!(json["color"], "#000000");
        assert_eq!(json["points"][1]["x"], 5.0);
    }

    #[test]
    fn test_deserialize_rejects_empty_points() {
        let json = r##"{"userId":"u1","color":"#000000","width":2,"points":[]}"##;
        assert!(serde_json::from_str::<Stroke>(json).is_err());
    }
}
