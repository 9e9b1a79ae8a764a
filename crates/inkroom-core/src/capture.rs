//! Input capture: mouse and touch funneled into one stroke state machine.
//!
//! Raw events are normalized into [`InputEvent`]s (canvas-local position,
//! phase, source) before they reach the [`CaptureMachine`]. One machine per
//! session holds the only `drawing` state, so a touch arriving during a mouse
//! drag can never touch the active point buffer.

use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

use crate::stroke::{Stroke, StrokeColor};

/// Smallest selectable stroke width.
pub const MIN_WIDTH: f64 = 1.0;
/// Largest selectable stroke width.
pub const MAX_WIDTH: f64 = 10.0;
/// Width selected when a session starts.
pub const DEFAULT_WIDTH: f64 = 2.0;

/// Which input modality produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputSource {
    Mouse,
    Touch,
}

/// Gesture phase, shared by both modalities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputPhase {
    /// Pointer down / touch start.
    Start,
    /// Pointer move / touch move.
    Move,
    /// Pointer up, pointer leave, or touch end.
    End,
}

/// A normalized input event in canvas-local coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InputEvent {
    pub source: InputSource,
    pub phase: InputPhase,
    pub position: Point,
}

impl InputEvent {
    pub fn new(source: InputSource, phase: InputPhase, position: Point) -> Self {
        Self {
            source,
            phase,
            position,
        }
    }

    /// Mouse button pressed at a canvas-local offset.
    pub fn mouse_down(offset: Point) -> Self {
        Self::new(InputSource::Mouse, InputPhase::Start, offset)
    }

    pub fn mouse_move(offset: Point) -> Self {
        Self::new(InputSource::Mouse, InputPhase::Move, offset)
    }

    pub fn mouse_up(offset: Point) -> Self {
        Self::new(InputSource::Mouse, InputPhase::End, offset)
    }

    /// Pointer left the canvas; ends a stroke like a release does.
    pub fn mouse_leave(offset: Point) -> Self {
        Self::new(InputSource::Mouse, InputPhase::End, offset)
    }
}

/// Translates touch client coordinates into canvas-local ones.
///
/// The canvas bounding rectangle is captured at touch start and reused
/// for the rest of the gesture.
#[derive(Debug, Clone, Default)]
pub struct TouchMapper {
    gesture_rect: Option<Rect>,
}

impl TouchMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map a touch at `client` to an [`InputEvent`].
    ///
    /// `canvas_rect` is the canvas' current bounding rectangle in client
    /// coordinates; it is only read on [`InputPhase::Start`], or when a move
    /// arrives without a preceding start.
    pub fn map(&mut self, phase: InputPhase, client: Point, canvas_rect: Rect) -> InputEvent {
        let rect = match phase {
            InputPhase::Start => *self.gesture_rect.insert(canvas_rect),
            InputPhase::Move | InputPhase::End => *self.gesture_rect.get_or_insert(canvas_rect),
        };
        if phase == InputPhase::End {
            self.gesture_rect = None;
        }
        let local = Point::new(client.x - rect.x0, client.y - rect.y0);
        InputEvent::new(InputSource::Touch, phase, local)
    }
}

/// Color and width applied to new strokes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToolSettings {
    color: StrokeColor,
    width: f64,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            color: StrokeColor::black(),
            width: DEFAULT_WIDTH,
        }
    }
}

impl ToolSettings {
    pub fn new(color: StrokeColor, width: f64) -> Self {
        let mut settings = Self::default();
        settings.set_color(color);
        settings.set_width(width);
        settings
    }

    pub fn color(&self) -> StrokeColor {
        self.color
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn set_color(&mut self, color: StrokeColor) {
        self.color = color;
    }

    /// Set the width, clamped to the selectable range. NaN is ignored.
    pub fn set_width(&mut self, width: f64) {
        if width.is_nan() {
            return;
        }
        self.width = width.clamp(MIN_WIDTH, MAX_WIDTH);
    }
}

/// What the caller must do in response to an input event.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureEffect {
    /// A gesture started: begin a local path at `at`.
    BeginPath {
        at: Point,
        color: StrokeColor,
        width: f64,
    },
    /// Extend the local path with a segment.
    ExtendPath {
        from: Point,
        to: Point,
        color: StrokeColor,
        width: f64,
    },
    /// The gesture ended and produced a stroke ready to send.
    Finished(Stroke),
    /// Nothing to do.
    Ignored,
}

#[derive(Debug, Clone, Default)]
enum CaptureState {
    #[default]
    Idle,
    Drawing {
        source: InputSource,
        points: Vec<Point>,
    },
}

/// Idle/Drawing state machine turning input events into strokes.
#[derive(Debug, Clone, Default)]
pub struct CaptureMachine {
    state: CaptureState,
}

impl CaptureMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_drawing(&self) -> bool {
        matches!(self.state, CaptureState::Drawing { .. })
    }

    /// Source that owns the active gesture, if any.
    pub fn active_source(&self) -> Option<InputSource> {
        match &self.state {
            CaptureState::Idle => None,
            CaptureState::Drawing { source, .. } => Some(*source),
        }
    }

    /// Points buffered for the active gesture.
    pub fn buffered_points(&self) -> &[Point] {
        match &self.state {
            CaptureState::Idle => &[],
            CaptureState::Drawing { points, .. } => points,
        }
    }

    /// Feed one event. `author_id` and `tool` are read at the moment of the event.
    pub fn handle(&mut self, event: InputEvent, author_id: &str, tool: &ToolSettings) -> CaptureEffect {
        if let Some(active) = self.active_source() {
            if active != event.source {
                log::debug!("ignoring {:?} input during {:?} gesture", event.source, active);
                return CaptureEffect::Ignored;
            }
        }

        match event.phase {
            InputPhase::Start => {
                // A second start from the owning source does not open a new buffer.
                if self.is_drawing() {
                    return CaptureEffect::Ignored;
                }
                self.state = CaptureState::Drawing {
                    source: event.source,
                    points: vec![event.position],
                };
                CaptureEffect::BeginPath {
                    at: event.position,
                    color: tool.color(),
                    width: tool.width(),
                }
            }
            InputPhase::Move => {
                let CaptureState::Drawing { points, .. } = &mut self.state else {
                    return CaptureEffect::Ignored;
                };
                let from = points.last().copied().unwrap_or(event.position);
                points.push(event.position);
                CaptureEffect::ExtendPath {
                    from,
                    to: event.position,
                    color: tool.color(),
                    width: tool.width(),
                }
            }
            InputPhase::End => {
                let CaptureState::Drawing { points, .. } = std::mem::take(&mut self.state) else {
                    return CaptureEffect::Ignored;
                };
                match Stroke::new(author_id, tool.color(), tool.width(), points) {
                    Ok(stroke) => CaptureEffect::Finished(stroke),
                    Err(e) => {
                        log::debug!("discarding capture: {}", e);
                        CaptureEffect::Ignored
                    }
                }
            }
        }
    }

    /// Abandon the active gesture without producing a stroke.
    pub fn cancel(&mut self) {
        self.state = CaptureState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(machine: &mut CaptureMachine, events: &[InputEvent]) -> Vec<CaptureEffect> {
        let tool = ToolSettings::default();
        events.iter().map(|e| machine.handle(*e, "me", &tool)).collect()
    }

    #[test]
    fn test_mouse_stroke_lifecycle() {
        let mut machine = CaptureMachine::new();
        let effects = run(
            &mut machine,
            &[
                InputEvent::mouse_down(Point::new(0.0, 0.0)),
                InputEvent::mouse_move(Point::new(5.0, 5.0)),
                InputEvent::mouse_up(Point::new(5.0, 5.0)),
            ],
        );

        assert!(matches!(effects[0], CaptureEffect::BeginPath { .. }));
        assert!(matches!(
            effects[1],
            CaptureEffect::ExtendPath { from, to, .. } if from == Point::ZERO && to == Point::new(5.0, 5.0)
        ));
        let CaptureEffect::Finished(stroke) = &effects[2] else {
            panic!("expected a finished stroke, got {:?}", effects[2]);
        };
        assert_eq!(stroke.author_id(), "me");
        assert_eq!(stroke.points(), &[Point::new(0.0, 0.0), Point::new(5.0, 5.0)]);
        assert!(!machine.is_drawing());
    }

    #[test]
    fn test_click_without_movement_yields_one_point_stroke() {
        let mut machine = CaptureMachine::new();
        let effects = run(
            &mut machine,
            &[
                InputEvent::mouse_down(Point::new(7.0, 7.0)),
                InputEvent::mouse_up(Point::new(7.0, 7.0)),
            ],
        );

        let CaptureEffect::Finished(stroke) = &effects[1] else {
            panic!("expected a finished stroke");
        };
        assert_eq!(stroke.len(), 1);
    }

    #[test]
    fn test_events_while_idle_are_ignored() {
        let mut machine = CaptureMachine::new();
        let effects = run(
            &mut machine,
            &[
                InputEvent::mouse_move(Point::new(1.0, 1.0)),
                InputEvent::mouse_leave(Point::new(1.0, 1.0)),
            ],
        );
        assert_eq!(effects, vec![CaptureEffect::Ignored, CaptureEffect::Ignored]);
    }

    #[test]
    fn test_touch_during_mouse_drag_is_ignored() {
        let mut machine = CaptureMachine::new();
        let touch = |phase, x| InputEvent::new(InputSource::Touch, phase, Point::new(x, x));
        let effects = run(
            &mut machine,
            &[
                InputEvent::mouse_down(Point::new(0.0, 0.0)),
                touch(InputPhase::Start, 50.0),
                touch(InputPhase::Move, 60.0),
                InputEvent::mouse_move(Point::new(1.0, 1.0)),
                touch(InputPhase::End, 60.0),
            ],
        );

        assert_eq!(effects[1], CaptureEffect::Ignored);
        assert_eq!(effects[2], CaptureEffect::Ignored);
        assert_eq!(effects[4], CaptureEffect::Ignored);
        assert_eq!(machine.active_source(), Some(InputSource::Mouse));
        assert_eq!(machine.buffered_points(), &[Point::new(0.0, 0.0), Point::new(1.0, 1.0)]);
    }

    #[test]
    fn test_stroke_uses_tool_at_release() {
        let mut machine = CaptureMachine::new();
        let mut tool = ToolSettings::default();
        machine.handle(InputEvent::mouse_down(Point::ZERO), "me", &tool);
        tool.set_color(StrokeColor::rgb(255, 0, 0));
        tool.set_width(6.0);

        let effect = machine.handle(InputEvent::mouse_up(Point::ZERO), "me", &tool);
        let CaptureEffect::Finished(stroke) = effect else {
            panic!("expected a finished stroke");
        };
        assert_eq!(stroke.color(), StrokeColor::rgb(255, 0, 0));
        assert!((stroke.width() - 6.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_cancel_drops_buffer() {
        let mut machine = CaptureMachine::new();
        run(&mut machine, &[InputEvent::mouse_down(Point::ZERO)]);
        machine.cancel();
        let effects = run(&mut machine, &[InputEvent::mouse_up(Point::ZERO)]);
        assert_eq!(effects, vec![CaptureEffect::Ignored]);
    }

    #[test]
    fn test_touch_mapper_uses_rect_from_gesture_start() {
        let mut mapper = TouchMapper::new();
        let rect = Rect::new(10.0, 20.0, 110.0, 220.0);
        let moved = Rect::new(50.0, 50.0, 150.0, 250.0);

        let start = mapper.map(InputPhase::Start, Point::new(15.0, 25.0), rect);
        let mid = mapper.map(InputPhase::Move, Point::new(30.0, 40.0), moved);
        let end = mapper.map(InputPhase::End, Point::new(30.0, 40.0), moved);

        assert_eq!(start.position, Point::new(5.0, 5.0));
        assert_eq!(mid.position, Point::new(20.0, 20.0));
        assert_eq!(end.position, Point::new(20.0, 20.0));
        assert_eq!(start.source, InputSource::Touch);

        let next = mapper.map(InputPhase::Start, Point::new(60.0, 60.0), moved);
        assert_eq!(next.position, Point::new(10.0, 10.0));
    }

    #[test]
    fn test_width_clamped() {
        let mut tool = ToolSettings::default();
        tool.set_width(42.0);
        assert!((tool.width() - MAX_WIDTH).abs() < f64::EPSILON);
        tool.set_width(0.0);
        assert!((tool.width() - MIN_WIDTH).abs() < f64::EPSILON);
        tool.set_width(f64::NAN);
        assert!((tool.width() - MIN_WIDTH).abs() < f64::EPSILON);
    }
}
