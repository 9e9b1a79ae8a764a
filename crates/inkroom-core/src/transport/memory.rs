//! In-process transport for tests and embedding.

use std::collections::VecDeque;

use super::{ConnectionState, Transport, TransportError, TransportEvent, TransportResult};

/// Transport that records sent frames and replays injected inbound events.
///
/// Starts in [`ConnectionState::Connecting`]; call [`MemoryTransport::open`]
/// to simulate the channel opening.
#[derive(Debug)]
pub struct MemoryTransport {
    state: ConnectionState,
    sent: Vec<String>,
    inbound: VecDeque<TransportEvent>,
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self {
            state: ConnectionState::Connecting,
            sent: Vec::new(),
            inbound: VecDeque::new(),
        }
    }

    /// Open the channel and queue an [`TransportEvent::Opened`].
    pub fn open(&mut self) {
        self.state = ConnectionState::Connected;
        self.inbound.push_back(TransportEvent::Opened);
    }

    /// Queue one inbound text frame.
    pub fn push_inbound(&mut self, frame: impl Into<String>) {
        self.inbound.push_back(TransportEvent::Message(frame.into()));
    }

    /// Simulate the remote end closing the channel.
    pub fn close_remote(&mut self) {
        self.state = ConnectionState::Disconnected;
        self.inbound.push_back(TransportEvent::Closed);
    }

    /// Frames sent so far, oldest first.
    pub fn sent(&self) -> &[String] {
        &self.sent
    }

    /// Take the frames sent so far.
    pub fn take_sent(&mut self) -> Vec<String> {
        std::mem::take(&mut self.sent)
    }
}

impl Transport for MemoryTransport {
    fn state(&self) -> ConnectionState {
        self.state
    }

    fn send(&mut self, frame: &str) -> TransportResult<()> {
        if self.state != ConnectionState::Connected {
            return Err(TransportError::NotOpen(self.state));
        }
        self.sent.push(frame.to_string());
        Ok(())
    }

    fn poll_events(&mut self) -> Vec<TransportEvent> {
        self.inbound.drain(..).collect()
    }

    fn close(&mut self) {
        if self.state == ConnectionState::Disconnected {
            return;
        }
        self.state = ConnectionState::Disconnected;
        self.inbound.push_back(TransportEvent::Closed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_requires_open() {
        let mut transport = MemoryTransport::new();
        assert_eq!(
            transport.send("x"),
            Err(TransportError::NotOpen(ConnectionState::Connecting))
        );
        assert!(transport.sent().is_empty());

        transport.open();
        transport.send("x").unwrap();
        assert_eq!(transport.take_sent(), vec!["x".to_string()]);
    }

    #[test]
    fn test_closed_transport_drops_sends() {
        let mut transport = MemoryTransport::new();
        transport.open();
        transport.close();
        assert!(transport.send("late").is_err());
        assert_eq!(
            transport.poll_events(),
            vec![TransportEvent::Opened, TransportEvent::Closed]
        );
    }

    #[test]
    fn test_inbound_order_preserved() {
        let mut transport = MemoryTransport::new();
        transport.push_inbound("a");
        transport.push_inbound("b");
        assert_eq!(
            transport.poll_events(),
            vec![
                TransportEvent::Message("a".to_string()),
                TransportEvent::Message("b".to_string())
            ]
        );
        assert!(transport.poll_events().is_empty());
    }
}
