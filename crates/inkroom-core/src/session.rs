//! Whiteboard session: the state owned by one mounted whiteboard view.
//!
//! A session holds the local identity, the room transport, the capture
//! machine, the shared stroke log, the local "my strokes" stack and the chat
//! log. Everything runs on the caller's thread: input handlers and
//! [`WhiteboardSession::poll`] each run to completion, so no locking is needed.
//!
//! Local strokes are not inserted into the log when they are finished. They
//! are sent to the relay and appended when they come back, so every client
//! applies the same sequence of appends and undos in relay order.

use kurbo::Point;
use thiserror::Error;

use crate::capture::{CaptureEffect, CaptureMachine, InputEvent, ToolSettings};
use crate::chat::{ChatEntry, ChatLog};
use crate::config::{ConfigError, TransportConfig};
use crate::identity::{KeyValueStore, StorageError, stable_user_id};
use crate::protocol::{self, Frame, Inbound};
use crate::stroke::{Stroke, StrokeColor};
use crate::stroke_log::StrokeLog;
use crate::transport::{Transport, TransportError, TransportEvent};

/// Errors raised while joining a room.
#[derive(Debug, Error)]
pub enum JoinError {
    #[error("identity unavailable: {0}")]
    Identity(#[from] StorageError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// What changed as a result of polling the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The transport opened.
    Connected,
    /// The transport closed. There is no reconnection.
    Disconnected,
    /// The transport failed.
    Failed { message: String },
    /// A stroke was appended to the log.
    StrokeAppended { author_id: String },
    /// An undo removed a stroke from the log.
    StrokeRemoved { author_id: String },
    /// A chat entry was appended.
    ChatAppended,
}

impl SessionEvent {
    /// Whether the canvas must be replayed from the log.
    pub fn needs_redraw(&self) -> bool {
        matches!(
            self,
            SessionEvent::StrokeAppended { .. } | SessionEvent::StrokeRemoved { .. }
        )
    }
}

/// Session state for one whiteboard view and its transport.
pub struct WhiteboardSession<T: Transport> {
    user_id: String,
    room: String,
    transport: T,
    capture: CaptureMachine,
    tool: ToolSettings,
    strokes: StrokeLog,
    /// Strokes finished locally and handed to the transport, newest last.
    my_strokes: Vec<Stroke>,
    chat: ChatLog,
    announce_join: bool,
}

impl<T: Transport> WhiteboardSession<T> {
    /// Create a session for `user_id` in `room` over `transport`.
    pub fn new(user_id: impl Into<String>, room: impl Into<String>, transport: T) -> Self {
        Self {
            user_id: user_id.into(),
            room: room.into(),
            transport,
            capture: CaptureMachine::new(),
            tool: ToolSettings::default(),
            strokes: StrokeLog::new(),
            my_strokes: Vec::new(),
            chat: ChatLog::new(),
            announce_join: true,
        }
    }

    /// Whether to send a join notice when the transport opens (default true).
    pub fn with_join_notice(mut self, announce: bool) -> Self {
        self.announce_join = announce;
        self
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn room(&self) -> &str {
        &self.room
    }

    pub fn strokes(&self) -> &StrokeLog {
        &self.strokes
    }

    /// Locally finished strokes still believed to be on the canvas.
    pub fn my_strokes(&self) -> &[Stroke] {
        &self.my_strokes
    }

    pub fn chat(&self) -> &ChatLog {
        &self.chat
    }

    pub fn tool(&self) -> &ToolSettings {
        &self.tool
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn is_drawing(&self) -> bool {
        self.capture.is_drawing()
    }

    /// Points of the gesture in progress, empty when idle.
    pub fn pending_points(&self) -> &[Point] {
        self.capture.buffered_points()
    }

    /// Whether the undo affordance should be offered.
    pub fn can_undo(&self) -> bool {
        !self.my_strokes.is_empty()
    }

    pub fn set_color(&mut self, color: StrokeColor) {
        self.tool.set_color(color);
    }

    pub fn set_width(&mut self, width: f64) {
        self.tool.set_width(width);
    }

    // --- Input ---

    /// Route one normalized input event through the capture machine.
    ///
    /// A finished stroke is sent to the relay and pushed onto the local stack
    /// when the send succeeds. The returned effect drives local ink.
    pub fn handle_input(&mut self, event: InputEvent) -> CaptureEffect {
        let effect = self.capture.handle(event, &self.user_id, &self.tool);
        if let CaptureEffect::Finished(stroke) = &effect {
            if self.send_frame(&Frame::Stroke(stroke.clone())) {
                self.my_strokes.push(stroke.clone());
            }
        }
        effect
    }

    /// Ask every participant, including this one, to remove our tail-most stroke.
    pub fn undo(&mut self) -> bool {
        self.send_frame(&Frame::undo(self.user_id.clone()))
    }

    /// Send a chat message. Blank text is not sent.
    pub fn send_chat(&mut self, text: &str) -> bool {
        match ChatEntry::message(&self.user_id, text) {
            Some(entry) => self.send_frame(&Frame::Chat(entry)),
            None => false,
        }
    }

    // --- Transport ---

    /// Drain transport events and apply inbound frames in arrival order.
    pub fn poll(&mut self) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        for event in self.transport.poll_events() {
            match event {
                TransportEvent::Opened => {
                    log::info!("{} connected to room {}", self.user_id, self.room);
                    if self.announce_join {
                        let notice = ChatEntry::joined(&self.user_id);
                        self.send_frame(&Frame::Chat(notice));
                    }
                    events.push(SessionEvent::Connected);
                }
                TransportEvent::Message(raw) => {
                    if let Some(applied) = self.handle_frame(&raw) {
                        events.push(applied);
                    }
                }
                TransportEvent::Closed => {
                    log::info!("connection to room {} closed", self.room);
                    events.push(SessionEvent::Disconnected);
                }
                TransportEvent::Error { message } => {
                    log::error!("transport error in room {}: {}", self.room, message);
                    events.push(SessionEvent::Failed { message });
                }
            }
        }
        events
    }

    /// Apply one inbound text frame.
    ///
    /// Malformed frames and unknown kinds are logged and discarded; they never
    /// affect later frames.
    pub fn handle_frame(&mut self, raw: &str) -> Option<SessionEvent> {
        let frame = match protocol::decode(raw) {
            Ok(Inbound::Frame(frame)) => frame,
            Ok(Inbound::Unknown(kind)) => {
                log::debug!("ignoring frame of unknown type {:?}", kind);
                return None;
            }
            Err(e) => {
                log::warn!("discarding inbound frame: {}", e);
                return None;
            }
        };

        match frame {
            Frame::Stroke(stroke) => {
                let author_id = stroke.author_id().to_string();
                self.strokes.append(stroke);
                Some(SessionEvent::StrokeAppended { author_id })
            }
            Frame::Undo { user_id } => {
                let removed = self.strokes.reconcile_undo(&user_id)?;
                if removed.is_by(&self.user_id) {
                    self.my_strokes.pop();
                }
                Some(SessionEvent::StrokeRemoved { author_id: user_id })
            }
            Frame::Chat(entry) => {
                self.chat.append(entry);
                Some(SessionEvent::ChatAppended)
            }
        }
    }

    /// End the session: best-effort leave notice, then close without waiting.
    ///
    /// Returns the closed transport; the logs are discarded.
    pub fn teardown(mut self) -> T {
        if self.transport.is_open() {
            let notice = ChatEntry::left(&self.user_id);
            self.send_frame(&Frame::Chat(notice));
        }
        self.capture.cancel();
        self.transport.close();
        log::info!("{} left room {}", self.user_id, self.room);
        self.transport
    }

    /// Encode and send a frame; failures are logged and the frame is dropped.
    fn send_frame(&mut self, frame: &Frame) -> bool {
        let encoded = match frame.encode() {
            Ok(encoded) => encoded,
            Err(e) => {
                log::error!("could not encode {} frame: {}", frame.kind(), e);
                return false;
            }
        };
        match self.transport.send(&encoded) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("dropping {} frame: {}", frame.kind(), e);
                false
            }
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl WhiteboardSession<crate::transport::NativeWebSocket> {
    /// Resolve the local identity and start connecting to `room`.
    ///
    /// The base address in `config` must be absolute on native targets.
    pub fn join<S: KeyValueStore + ?Sized>(
        config: &TransportConfig,
        room: Option<&str>,
        store: &S,
    ) -> Result<Self, JoinError> {
        let user_id = stable_user_id(store)?;
        let room = config.room_or_default(room).to_string();
        let url = config.room_url(Some(&room), None)?;
        let transport = crate::transport::NativeWebSocket::open(&url)?;
        Ok(Self::new(user_id, room, transport))
    }
}

#[cfg(target_arch = "wasm32")]
impl WhiteboardSession<crate::transport::WasmWebSocket> {
    /// Resolve the local identity and start connecting to `room`.
    ///
    /// A relative base address is resolved against `page_origin`.
    pub fn join<S: KeyValueStore + ?Sized>(
        config: &TransportConfig,
        room: Option<&str>,
        store: &S,
        page_origin: &url::Url,
    ) -> Result<Self, JoinError> {
        let user_id = stable_user_id(store)?;
        let room = config.room_or_default(room).to_string();
        let url = config.room_url(Some(&room), Some(page_origin))?;
        let mut transport = crate::transport::WasmWebSocket::new();
        transport.connect(url.as_str())?;
        Ok(Self::new(user_id, room, transport))
    }
}
