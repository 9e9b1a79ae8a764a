//! Browser WebSocket client (WASM only).

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::Closure;
use web_sys::{CloseEvent, ErrorEvent, MessageEvent, WebSocket};

use super::{
    ConnectionState, Transport, TransportError, TransportEvent, TransportResult, track_state,
};

type EventQueue = Rc<RefCell<Vec<TransportEvent>>>;

/// The four socket callbacks. They must outlive the socket's use of them.
struct Handlers {
    _open: Closure<dyn Fn()>,
    _message: Closure<dyn Fn(MessageEvent)>,
    _close: Closure<dyn Fn(CloseEvent)>,
    _error: Closure<dyn Fn(ErrorEvent)>,
}

impl Handlers {
    /// Build callbacks that push into `queue` and install them on `ws`.
    fn attach(ws: &WebSocket, queue: &EventQueue) -> Self {
        let push = |queue: &EventQueue| {
            let queue = queue.clone();
            move |event: TransportEvent| queue.borrow_mut().push(event)
        };

        let opened = push(queue);
        let open = Closure::wrap(Box::new(move || opened(TransportEvent::Opened)) as Box<dyn Fn()>);

        let received = push(queue);
        let message = Closure::wrap(Box::new(move |e: MessageEvent| {
            // Binary frames are not part of the protocol.
            if let Ok(text) = e.data().dyn_into::<js_sys::JsString>() {
                received(TransportEvent::Message(text.into()));
            }
        }) as Box<dyn Fn(MessageEvent)>);

        let closed = push(queue);
        let close = Closure::wrap(
            Box::new(move |_: CloseEvent| closed(TransportEvent::Closed)) as Box<dyn Fn(CloseEvent)>,
        );

        let failed = push(queue);
        let error = Closure::wrap(Box::new(move |e: ErrorEvent| {
            let message = e.message();
            failed(TransportEvent::Error {
                message: if message.is_empty() {
                    "relay socket error".to_string()
                } else {
                    message
                },
            });
        }) as Box<dyn Fn(ErrorEvent)>);

        ws.set_onopen(Some(open.as_ref().unchecked_ref()));
        ws.set_onmessage(Some(message.as_ref().unchecked_ref()));
        ws.set_onclose(Some(close.as_ref().unchecked_ref()));
        ws.set_onerror(Some(error.as_ref().unchecked_ref()));

        Self {
            _open: open,
            _message: message,
            _close: close,
            _error: error,
        }
    }

    /// Unhook from `ws` so no callback fires after the closures drop.
    fn detach(self, ws: &WebSocket) {
        ws.set_onopen(None);
        ws.set_onmessage(None);
        ws.set_onclose(None);
        ws.set_onerror(None);
        drop(self);
    }
}

/// Relay connection over the browser's `WebSocket`.
///
/// Callbacks queue events; [`Transport::poll_events`] drains them.
pub struct WasmWebSocket {
    socket: Option<(WebSocket, Handlers)>,
    state: ConnectionState,
    queue: EventQueue,
}

impl WasmWebSocket {
    pub fn new() -> Self {
        Self {
            socket: None,
            state: ConnectionState::Disconnected,
            queue: EventQueue::default(),
        }
    }

    /// Open a browser socket to `url`; the handshake completes asynchronously.
    pub fn connect(&mut self, url: &str) -> TransportResult<()> {
        if self.socket.is_some() {
            return Err(TransportError::AlreadyConnected);
        }

        let ws = WebSocket::new(url).map_err(|e| TransportError::InvalidAddress(format!("{e:?}")))?;
        let handlers = Handlers::attach(&ws, &self.queue);
        self.socket = Some((ws, handlers));
        self.state = ConnectionState::Connecting;
        log::info!("connecting to relay at {}", url);
        Ok(())
    }
}

impl Transport for WasmWebSocket {
    fn state(&self) -> ConnectionState {
        self.state
    }

    fn send(&mut self, frame: &str) -> TransportResult<()> {
        // readyState is authoritative in the browser, ahead of polled events
        match &self.socket {
            Some((ws, _)) if ws.ready_state() == WebSocket::OPEN => ws
                .send_with_str(frame)
                .map_err(|e| TransportError::SendFailed(format!("{e:?}"))),
            _ => Err(TransportError::NotOpen(self.state)),
        }
    }

    fn poll_events(&mut self) -> Vec<TransportEvent> {
        let events = std::mem::take(&mut *self.queue.borrow_mut());
        track_state(&mut self.state, &events);
        events
    }

    fn close(&mut self) {
        if let Some((ws, handlers)) = self.socket.take() {
            handlers.detach(&ws);
            let _ = ws.close();
        }
        self.queue.borrow_mut().clear();
        self.state = ConnectionState::Disconnected;
    }
}

impl Default for WasmWebSocket {
    fn default() -> Self {
        Self::new()
    }
}
