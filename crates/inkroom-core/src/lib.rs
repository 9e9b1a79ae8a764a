//! Inkroom Core Library
//!
//! Platform-agnostic data structures and logic for the Inkroom shared
//! whiteboard: strokes and the replicated stroke log, input capture, wire
//! frames, chat, identity, and the room transport.

pub mod capture;
pub mod chat;
pub mod config;
pub mod identity;
pub mod protocol;
pub mod session;
pub mod stroke;
pub mod stroke_log;
pub mod transport;

pub use capture::{CaptureEffect, CaptureMachine, InputEvent, InputPhase, InputSource, ToolSettings, TouchMapper};
pub use chat::{ChatEntry, ChatKind, ChatLog};
pub use config::TransportConfig;
pub use identity::{KeyValueStore, MemoryStore, stable_user_id};
pub use protocol::{Frame, Inbound};
pub use session::{JoinError, SessionEvent, WhiteboardSession};
pub use stroke::{Stroke, StrokeColor, StrokeError};
pub use stroke_log::StrokeLog;
pub use transport::{ConnectionState, MemoryTransport, PlatformWebSocket, Transport, TransportEvent};
