//! Native WebSocket client.
//!
//! The socket lives on a worker thread; the caller exchanges frames with it
//! over two mpsc channels so `send` and `poll_events` never block.

use std::net::TcpStream;
use std::sync::mpsc::{Receiver, Sender, TryRecvError, channel};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket, connect};
use url::Url;

use super::{
    ConnectionState, Transport, TransportError, TransportEvent, TransportResult, track_state,
};

/// How long a read may block before the worker checks its outbox again.
const READ_SLICE: Duration = Duration::from_millis(50);
const WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// First 100 characters of a frame, for logging.
fn preview(frame: &str) -> &str {
    match frame.char_indices().nth(100) {
        Some((end, _)) => &frame[..end],
        None => frame,
    }
}

/// Work handed from the session to the socket worker.
enum Outbound {
    Frame(String),
    Shutdown,
}

/// Relay connection backed by tungstenite on a worker thread.
pub struct NativeWebSocket {
    state: ConnectionState,
    outbox: Option<Sender<Outbound>>,
    inbox: Option<Receiver<TransportEvent>>,
    /// Detached on close; the worker exits once the outbox hangs up.
    worker: Option<JoinHandle<()>>,
}

impl NativeWebSocket {
    pub fn new() -> Self {
        Self {
            state: ConnectionState::Disconnected,
            outbox: None,
            inbox: None,
            worker: None,
        }
    }

    /// Create a client and start connecting to `url`.
    pub fn open(url: &Url) -> TransportResult<Self> {
        let mut ws = Self::new();
        ws.connect(url.as_str())?;
        Ok(ws)
    }

    /// Start connecting to `url` in the background.
    ///
    /// Returns once the worker is spawned; the outcome arrives later as
    /// [`TransportEvent::Opened`] or [`TransportEvent::Error`].
    pub fn connect(&mut self, url: &str) -> TransportResult<()> {
        if self.outbox.is_some() {
            return Err(TransportError::AlreadyConnected);
        }

        let endpoint = Url::parse(url).map_err(|e| TransportError::InvalidAddress(e.to_string()))?;
        // tungstenite is built without TLS, so only plain ws can ever connect.
        if endpoint.scheme() != "ws" {
            return Err(TransportError::InvalidAddress(format!(
                "native relay endpoint must use ws, got {}",
                endpoint.scheme()
            )));
        }

        let (outbox, outbox_rx) = channel();
        let (inbox_tx, inbox) = channel();
        let worker = thread::spawn(move || run_socket(endpoint, outbox_rx, inbox_tx));

        self.state = ConnectionState::Connecting;
        self.outbox = Some(outbox);
        self.inbox = Some(inbox);
        self.worker = Some(worker);
        Ok(())
    }
}

/// Worker body: connect, then alternate between draining the outbox and a
/// short blocking read until either side goes away.
fn run_socket(endpoint: Url, outbox: Receiver<Outbound>, inbox: Sender<TransportEvent>) {
    log::info!("connecting to relay at {}", endpoint);

    let mut socket = match connect(endpoint.as_str()) {
        Ok((socket, response)) => {
            log::info!("relay handshake done ({})", response.status());
            socket
        }
        Err(e) => {
            log::error!("could not reach relay at {}: {}", endpoint, e);
            let _ = inbox.send(TransportEvent::Error {
                message: format!("connect failed: {e}"),
            });
            return;
        }
    };
    set_timeouts(&mut socket);
    let _ = inbox.send(TransportEvent::Opened);

    loop {
        match outbox.try_recv() {
            Ok(Outbound::Frame(frame)) => {
                log::debug!("-> {}", preview(&frame));
                if let Err(e) = socket.send(Message::Text(frame)) {
                    log::error!("relay write failed: {}", e);
                    break;
                }
            }
            Ok(Outbound::Shutdown) => {
                let _ = socket.close(None);
                break;
            }
            Err(TryRecvError::Disconnected) => break,
            Err(TryRecvError::Empty) => {}
        }

        match socket.read() {
            Ok(Message::Text(frame)) => {
                log::debug!("<- {}", preview(&frame));
                let event = TransportEvent::Message(frame);
                if inbox.send(event).is_err() {
                    break;
                }
            }
            Ok(Message::Close(_)) => {
                log::info!("relay closed the connection");
                break;
            }
            // Pings are answered inside tungstenite; binary frames carry nothing for us.
            Ok(_) => {}
            Err(tungstenite::Error::Io(ref e))
                if matches!(
                    e.kind(),
                    std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
                ) => {}
            Err(e) => {
                log::error!("relay read failed: {}", e);
                break;
            }
        }
    }

    log::debug!("relay worker for {} stopped", endpoint);
    let _ = inbox.send(TransportEvent::Closed);
}

fn set_timeouts(socket: &mut WebSocket<MaybeTlsStream<TcpStream>>) {
    match socket.get_mut() {
        MaybeTlsStream::Plain(tcp) => {
            let _ = tcp.set_read_timeout(Some(READ_SLICE));
            let _ = tcp.set_write_timeout(Some(WRITE_TIMEOUT));
        }
        #[allow(unreachable_patterns)]
        _ => log::debug!("non-plain stream, keeping default timeouts"),
    }
}

impl Transport for NativeWebSocket {
    fn state(&self) -> ConnectionState {
        self.state
    }

    fn send(&mut self, frame: &str) -> TransportResult<()> {
        if self.state != ConnectionState::Connected {
            return Err(TransportError::NotOpen(self.state));
        }
        let outbox = self
            .outbox
            .as_ref()
            .ok_or(TransportError::NotOpen(ConnectionState::Disconnected))?;
        outbox
            .send(Outbound::Frame(frame.to_string()))
            .map_err(|e| TransportError::SendFailed(e.to_string()))
    }

    fn poll_events(&mut self) -> Vec<TransportEvent> {
        let Some(inbox) = &self.inbox else {
            return Vec::new();
        };
        let events: Vec<TransportEvent> = inbox.try_iter().collect();
        track_state(&mut self.state, &events);
        events
    }

    fn close(&mut self) {
        if let Some(outbox) = self.outbox.take() {
            let _ = outbox.send(Outbound::Shutdown);
        }
        self.inbox = None;
        self.worker = None;
        self.state = ConnectionState::Disconnected;
    }
}

impl Default for NativeWebSocket {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for NativeWebSocket {
    fn drop(&mut self) {
        self.close();
    }
}
