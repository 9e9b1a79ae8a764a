//! Replay-log renderer over a painter abstraction.

use inkroom_core::capture::CaptureEffect;
use inkroom_core::stroke::{Stroke, StrokeColor};
use inkroom_core::stroke_log::StrokeLog;
use kurbo::{Point, Rect, Size};
use thiserror::Error;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Initialization failed: {0}")]
    InitFailed(String),
    #[error("Render failed: {0}")]
    RenderFailed(String),
    #[error("Surface error: {0}")]
    Surface(String),
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RendererError>;

/// Drawing backend the renderer replays into.
///
/// Implementations can record commands, build a Vello scene, or draw to any
/// other 2D surface. All lines use round caps and joins.
pub trait Painter {
    /// Discard everything drawn so far and start a new frame of `size`.
    fn clear(&mut self, size: Size);

    /// Fill an axis-aligned rectangle.
    fn fill_rect(&mut self, rect: Rect, color: StrokeColor);

    /// Stroke a single straight segment.
    fn stroke_line(&mut self, from: Point, to: Point, color: StrokeColor, width: f64);

    /// Stroke a polyline through `points`.
    ///
    /// A single point must render as a round dot of diameter `width`.
    fn stroke_polyline(&mut self, points: &[Point], color: StrokeColor, width: f64);

    /// Draw a finished stroke with its own color and width.
    fn stroke(&mut self, stroke: &Stroke) {
        self.stroke_polyline(stroke.points(), stroke.color(), stroke.width());
    }
}

/// Notepad paper fill.
pub const PAPER_COLOR: StrokeColor = StrokeColor::rgb(0xfd, 0xf6, 0xe3);
/// Horizontal guide line color.
pub const GUIDE_COLOR: StrokeColor = StrokeColor::rgb(0xd0, 0xcf, 0xc7);
/// Distance between guide lines.
pub const GUIDE_SPACING: f64 = 32.0;
/// Guide line width.
pub const GUIDE_WIDTH: f64 = 1.0;

/// Fixed background painted under every replay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Background {
    pub fill: StrokeColor,
    pub guide_color: StrokeColor,
    pub guide_width: f64,
    /// Guide spacing; zero or less disables guides.
    pub guide_spacing: f64,
}

impl Default for Background {
    fn default() -> Self {
        Self::notepad()
    }
}

impl Background {
    /// Lined paper: fill plus horizontal guides every [`GUIDE_SPACING`].
    pub const fn notepad() -> Self {
        Self {
            fill: PAPER_COLOR,
            guide_color: GUIDE_COLOR,
            guide_width: GUIDE_WIDTH,
            guide_spacing: GUIDE_SPACING,
        }
    }

    /// Solid fill without guides.
    pub const fn plain(fill: StrokeColor) -> Self {
        Self {
            fill,
            guide_color: fill,
            guide_width: 0.0,
            guide_spacing: 0.0,
        }
    }

    /// Y positions of the guides for a surface `height` tall.
    ///
    /// The first guide sits one spacing below the top; guides stop before `height`.
    pub fn guide_rows(&self, height: f64) -> Vec<f64> {
        if self.guide_spacing.is_nan() || self.guide_spacing <= 0.0 || !height.is_finite() {
            return Vec::new();
        }
        let mut rows = Vec::new();
        let mut y = self.guide_spacing;
        while y < height {
            rows.push(y);
            y += self.guide_spacing;
        }
        rows
    }
}

/// Context for a single redraw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderContext {
    /// Surface size in logical pixels.
    pub size: Size,
    pub background: Background,
}

impl RenderContext {
    /// Create a new render context with the notepad background.
    pub fn new(size: Size) -> Self {
        Self {
            size,
            background: Background::notepad(),
        }
    }

    /// Create a context, rejecting sizes that cannot back a surface.
    pub fn checked(size: Size) -> RenderResult<Self> {
        if !size.is_finite() || size.width < 0.0 || size.height < 0.0 {
            return Err(RendererError::Surface(format!(
                "invalid surface size {}x{}",
                size.width, size.height
            )));
        }
        Ok(Self::new(size))
    }

    /// Set the background.
    pub fn with_background(mut self, background: Background) -> Self {
        self.background = background;
        self
    }

    /// Whole surface rectangle.
    pub fn surface(&self) -> Rect {
        Rect::from_origin_size(Point::ZERO, self.size)
    }
}

/// Replays a [`StrokeLog`] onto a [`Painter`].
///
/// The output is a pure function of the log and the context: there is no
/// incremental state, so every change costs a full repaint.
pub struct Renderer;

impl Renderer {
    /// Clear, paint the background, then every stroke in log order.
    ///
    /// Strokes that cannot reach the surface are skipped.
    pub fn redraw<P: Painter + ?Sized>(log: &StrokeLog, ctx: &RenderContext, painter: &mut P) {
        painter.clear(ctx.size);
        Self::paint_background(ctx, painter);
        let surface = ctx.surface();
        let mut drawn = 0;
        for stroke in log.iter().filter(|s| Self::is_visible(s, surface)) {
            Self::draw_stroke(stroke, painter);
            drawn += 1;
        }
        log::trace!(
            "replayed {}/{} strokes ({} points)",
            drawn,
            log.len(),
            log.total_points()
        );
    }

    /// Whether any ink of `stroke` lands on `surface`, caps included.
    pub fn is_visible(stroke: &Stroke, surface: Rect) -> bool {
        let half = stroke.width() / 2.0;
        let reach = stroke.bounds().inflate(half, half);
        reach.x1 >= surface.x0
            && reach.x0 <= surface.x1
            && reach.y1 >= surface.y0
            && reach.y0 <= surface.y1
    }

    /// Paint the fill and guide lines over the whole surface.
    pub fn paint_background<P: Painter + ?Sized>(ctx: &RenderContext, painter: &mut P) {
        let background = &ctx.background;
        painter.fill_rect(ctx.surface(), background.fill);
        for y in background.guide_rows(ctx.size.height) {
            painter.stroke_line(
                Point::new(0.0, y),
                Point::new(ctx.size.width, y),
                background.guide_color,
                background.guide_width,
            );
        }
    }

    /// Draw one stroke with its stored color and width.
    pub fn draw_stroke<P: Painter + ?Sized>(stroke: &Stroke, painter: &mut P) {
        painter.stroke(stroke);
    }
}

/// Immediate local feedback for the gesture in progress.
///
/// Live ink is drawn straight onto the painter and is replaced by the next
/// replay once the stroke comes back from the relay.
pub struct LiveInk;

impl LiveInk {
    /// Draw the visible part of a capture effect.
    pub fn apply<P: Painter + ?Sized>(effect: &CaptureEffect, painter: &mut P) {
        match effect {
            CaptureEffect::BeginPath { at, color, width } => {
                painter.stroke_polyline(&[*at], *color, *width);
            }
            CaptureEffect::ExtendPath {
                from,
                to,
                color,
                width,
            } => painter.stroke_line(*from, *to, *color, *width),
            CaptureEffect::Finished(_) | CaptureEffect::Ignored => {}
        }
    }

    /// Repaint an unfinished gesture, e.g. after a replay wiped it.
    pub fn restore<P: Painter + ?Sized>(points: &[Point], color: StrokeColor, width: f64, painter: &mut P) {
        if !points.is_empty() {
            painter.stroke_polyline(points, color, width);
        }
    }
}
