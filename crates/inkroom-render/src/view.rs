//! The mounted whiteboard: one session wired to one painter.

use inkroom_core::capture::{CaptureEffect, InputEvent, InputPhase, InputSource, TouchMapper};
use inkroom_core::session::{SessionEvent, WhiteboardSession};
use inkroom_core::stroke::StrokeColor;
use inkroom_core::transport::Transport;
use kurbo::{Point, Rect, Size};

use crate::renderer::{Background, LiveInk, Painter, RenderContext, RenderResult, Renderer};

/// A whiteboard view for its whole lifetime: mount, input, pump, unmount.
///
/// The view owns the session and the painter. Input handlers draw live ink
/// immediately; [`WhiteboardView::pump`] applies inbound frames and replays
/// the log whenever it changed.
pub struct WhiteboardView<T: Transport, P: Painter> {
    session: WhiteboardSession<T>,
    painter: P,
    ctx: RenderContext,
    /// Canvas position in client coordinates, for touch translation.
    canvas_origin: Point,
    touch: TouchMapper,
}

impl<T: Transport, P: Painter> WhiteboardView<T, P> {
    /// Mount a view of `size` and paint the empty board.
    pub fn mount(session: WhiteboardSession<T>, painter: P, size: Size) -> Self {
        let mut view = Self {
            session,
            painter,
            ctx: RenderContext::new(size),
            canvas_origin: Point::ZERO,
            touch: TouchMapper::new(),
        };
        view.redraw();
        log::debug!(
            "mounted whiteboard for {} in room {}",
            view.session.user_id(),
            view.session.room()
        );
        view
    }

    /// Replace the background and repaint.
    pub fn with_background(mut self, background: Background) -> Self {
        self.ctx = self.ctx.with_background(background);
        self.redraw();
        self
    }

    pub fn session(&self) -> &WhiteboardSession<T> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut WhiteboardSession<T> {
        &mut self.session
    }

    pub fn painter(&self) -> &P {
        &self.painter
    }

    pub fn size(&self) -> Size {
        self.ctx.size
    }

    /// Resize the surface and repaint it. Invalid sizes leave the view unchanged.
    pub fn resize(&mut self, size: Size) -> RenderResult<()> {
        let ctx = RenderContext::checked(size)?.with_background(self.ctx.background);
        self.ctx = ctx;
        self.redraw();
        Ok(())
    }

    /// Move the canvas within the client area (affects touch input only).
    pub fn set_canvas_origin(&mut self, origin: Point) {
        self.canvas_origin = origin;
    }

    fn canvas_rect(&self) -> Rect {
        Rect::from_origin_size(self.canvas_origin, self.ctx.size)
    }

    // --- Input ---

    /// Pointer event at a canvas-local offset.
    pub fn pointer(&mut self, phase: InputPhase, offset: Point) -> CaptureEffect {
        self.input(InputEvent::new(InputSource::Mouse, phase, offset))
    }

    /// Touch event at client coordinates.
    pub fn touch(&mut self, phase: InputPhase, client: Point) -> CaptureEffect {
        let event = self.touch.map(phase, client, self.canvas_rect());
        self.input(event)
    }

    /// Route a normalized event through capture and draw its live ink.
    ///
    /// A finished stroke that could not be sent is wiped by an immediate
    /// replay, since no echo will ever arrive to replace its live ink.
    pub fn input(&mut self, event: InputEvent) -> CaptureEffect {
        let sent_before = self.session.my_strokes().len();
        let effect = self.session.handle_input(event);
        LiveInk::apply(&effect, &mut self.painter);
        if matches!(effect, CaptureEffect::Finished(_))
            && self.session.my_strokes().len() == sent_before
        {
            self.redraw();
        }
        effect
    }

    pub fn set_color(&mut self, color: StrokeColor) {
        self.session.set_color(color);
    }

    pub fn set_width(&mut self, width: f64) {
        self.session.set_width(width);
    }

    pub fn undo(&mut self) -> bool {
        self.session.undo()
    }

    pub fn send_chat(&mut self, text: &str) -> bool {
        self.session.send_chat(text)
    }

    // --- Rendering ---

    /// Poll the transport; replay the log if any frame changed it.
    pub fn pump(&mut self) -> Vec<SessionEvent> {
        let events = self.session.poll();
        if events.iter().any(SessionEvent::needs_redraw) {
            self.redraw();
        }
        events
    }

    /// Replay the whole log, then restore any gesture still in progress.
    pub fn redraw(&mut self) {
        Renderer::redraw(self.session.strokes(), &self.ctx, &mut self.painter);
        let tool = *self.session.tool();
        LiveInk::restore(
            self.session.pending_points(),
            tool.color(),
            tool.width(),
            &mut self.painter,
        );
    }

    /// Tear the session down and hand back the transport and painter.
    pub fn unmount(self) -> (T, P) {
        let transport = self.session.teardown();
        (transport, self.painter)
    }
}
