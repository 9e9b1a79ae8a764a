//! Transport: one ordered, bidirectional text channel per open whiteboard.
//!
//! Sends are fire-and-forget. A send while the channel is not open is
//! dropped with a warning; nothing is queued, retried, or reconnected.

mod memory;

#[cfg(not(target_arch = "wasm32"))]
mod native;

#[cfg(target_arch = "wasm32")]
mod wasm;

pub use memory::MemoryTransport;

#[cfg(not(target_arch = "wasm32"))]
pub use native::NativeWebSocket;

#[cfg(target_arch = "wasm32")]
pub use wasm::WasmWebSocket;

use thiserror::Error;

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Error,
}

/// Events reported by a transport, drained with [`Transport::poll_events`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The channel is open and may send.
    Opened,
    /// One inbound text frame.
    Message(String),
    /// The channel closed, locally or remotely. It will not reopen.
    Closed,
    /// The channel failed.
    Error { message: String },
}

/// Transport errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("channel is not open ({0:?})")]
    NotOpen(ConnectionState),
    #[error("already connected")]
    AlreadyConnected,
    #[error("invalid address: {0}")]
    InvalidAddress(String),
    #[error("send failed: {0}")]
    SendFailed(String),
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// A room-scoped message channel.
pub trait Transport {
    /// Current connection state.
    fn state(&self) -> ConnectionState;

    /// Transmit one text frame. Fails without queueing when not open.
    fn send(&mut self, frame: &str) -> TransportResult<()>;

    /// Drain pending events (non-blocking).
    fn poll_events(&mut self) -> Vec<TransportEvent>;

    /// Close the channel. Pending sends are not flushed and no reply is awaited.
    fn close(&mut self);

    /// Check if connected.
    fn is_open(&self) -> bool {
        self.state() == ConnectionState::Connected
    }
}

/// Apply a batch of events to a tracked state.
pub(crate) fn track_state(state: &mut ConnectionState, events: &[TransportEvent]) {
    for event in events {
        match event {
            TransportEvent::Opened => *state = ConnectionState::Connected,
            TransportEvent::Closed => *state = ConnectionState::Disconnected,
            TransportEvent::Error { .. } => *state = ConnectionState::Error,
            TransportEvent::Message(_) => {}
        }
    }
}

// ============================================================================
// Platform type alias
// ============================================================================

/// Platform-specific WebSocket client type.
#[cfg(target_arch = "wasm32")]
pub type PlatformWebSocket = WasmWebSocket;

#[cfg(not(target_arch = "wasm32"))]
pub type PlatformWebSocket = NativeWebSocket;
