//! Inkroom WebSocket Relay
//!
//! A room-scoped relay for whiteboard clients. Every text frame a client sends
//! is forwarded verbatim to every client in the same room, the sender
//! included, through one broadcast channel per room. All subscribers of a room
//! therefore see the same frames in the same order.
//!
//! ## Endpoints
//!
//! - `GET /` banner
//! - `GET /health` liveness probe
//! - `GET /ws/canvas?roomId=<id>` WebSocket upgrade; a missing room joins `default`

use axum::{
    Router,
    extract::{
        Query, State,
        ws::{CloseFrame, Message, Utf8Bytes, WebSocket, WebSocketUpgrade, close_code},
    },
    response::IntoResponse,
    routing::get,
};
use dashmap::DashMap;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use std::{collections::HashSet, net::SocketAddr, sync::Arc, time::Duration};
use thiserror::Error;
use tokio::sync::broadcast;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Environment variable holding the listen address.
pub const ADDR_ENV: &str = "INKROOM_RELAY_ADDR";
/// Environment variable holding the per-room channel capacity.
pub const CAPACITY_ENV: &str = "INKROOM_ROOM_CAPACITY";
/// Listen address used when none is configured.
pub const DEFAULT_ADDR: &str = "0.0.0.0:8080";
/// Frames buffered per room before slow clients start lagging.
pub const DEFAULT_CAPACITY: usize = 256;
/// Room joined when the request carries no `roomId`.
pub const DEFAULT_ROOM: &str = "default";
/// How long one forward may block before the peer is dropped as stalled.
const WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// Relay errors.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("invalid relay address {value:?}: {source}")]
    InvalidAddr {
        value: String,
        source: std::net::AddrParseError,
    },
    #[error("invalid room capacity {0:?}: expected a positive integer")]
    InvalidCapacity(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Relay configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    pub addr: SocketAddr,
    pub room_capacity: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            room_capacity: DEFAULT_CAPACITY,
        }
    }
}

impl RelayConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, RelayError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using `lookup` for each variable; unset or blank values use defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, RelayError> {
        let read = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(value) = read(ADDR_ENV) {
            config.addr = value
                .parse()
                .map_err(|source| RelayError::InvalidAddr { value, source })?;
        }
        if let Some(value) = read(CAPACITY_ENV) {
            config.room_capacity = match value.parse::<usize>() {
                Ok(capacity) if capacity > 0 => capacity,
                _ => return Err(RelayError::InvalidCapacity(value)),
            };
        }
        Ok(config)
    }
}

/// Room state
struct Room {
    /// Broadcast channel for this room
    tx: broadcast::Sender<Utf8Bytes>,
    /// Connected peer IDs
    peers: HashSet<String>,
}

impl Room {
    fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            tx,
            peers: HashSet::new(),
        }
    }
}

/// Shared relay state
pub struct AppState {
    /// Active rooms
    rooms: DashMap<String, Room>,
    room_capacity: usize,
}

impl AppState {
    pub fn new(room_capacity: usize) -> Self {
        Self {
            rooms: DashMap::new(),
            room_capacity: room_capacity.max(1),
        }
    }

    /// Number of rooms with at least one peer.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Number of peers connected to `room_id`.
    pub fn peer_count(&self, room_id: &str) -> usize {
        self.rooms.get(room_id).map_or(0, |room| room.peers.len())
    }

    /// Add peer to room; returns the room's sender and a fresh subscription.
    fn join_room(
        &self,
        room_id: &str,
        peer_id: &str,
    ) -> (broadcast::Sender<Utf8Bytes>, broadcast::Receiver<Utf8Bytes>) {
        let mut room = self
            .rooms
            .entry(room_id.to_string())
            .or_insert_with(|| Room::new(self.room_capacity));
        room.peers.insert(peer_id.to_string());
        (room.tx.clone(), room.tx.subscribe())
    }

    /// Remove peer from room, dropping the room once it is empty.
    fn leave_room(&self, room_id: &str, peer_id: &str) {
        if let Some(mut room) = self.rooms.get_mut(room_id) {
            room.peers.remove(peer_id);
        }
        self.rooms.remove_if(room_id, |_, room| room.peers.is_empty());
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// Build the relay router with tracing and permissive CORS.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/ws/canvas", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind `config.addr` and serve until the process stops.
pub async fn serve(config: RelayConfig) -> Result<(), RelayError> {
    let state = Arc::new(AppState::new(config.room_capacity));
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    info!("Inkroom relay listening on {}", listener.local_addr()?);
    info!("WebSocket endpoint: /ws/canvas?roomId=<room>");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

/// Index page
async fn index() -> &'static str {
    "Inkroom Relay Server - Connect via WebSocket at /ws/canvas?roomId=<room>"
}

/// Health check
async fn health() -> &'static str {
    "ok"
}

#[derive(Debug, Deserialize)]
struct RoomQuery {
    #[serde(rename = "roomId")]
    room_id: Option<String>,
}

/// WebSocket upgrade handler
async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<RoomQuery>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let room = query
        .room_id
        .filter(|room| !room.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_ROOM.to_string());
    ws.on_upgrade(move |socket| handle_socket(socket, state, room))
}

/// Handle a WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<AppState>, room: String) {
    let peer_id = Uuid::new_v4().to_string();
    let (room_tx, mut room_rx) = state.join_room(&room, &peer_id);
    info!("Peer {} joined room {} ({} connected)", peer_id, room, state.peer_count(&room));

    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            // Handle incoming frames from the client
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        // Our own subscription keeps the channel open.
                        let _ = room_tx.send(text);
                    }
                    Some(Ok(Message::Binary(data))) => {
                        debug!("Ignoring {} byte binary frame from {}", data.len(), peer_id);
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        break;
                    }
                    Some(Ok(_)) => {} // Ignore ping/pong
                    Some(Err(e)) => {
                        warn!("WebSocket error for {}: {}", peer_id, e);
                        break;
                    }
                }
            }

            // Forward room frames, including our own, in channel order
            frame = room_rx.recv() => {
                match frame {
                    Ok(text) => {
                        match tokio::time::timeout(WRITE_TIMEOUT, sender.send(Message::Text(text))).await {
                            Ok(Ok(())) => {}
                            Ok(Err(_)) => break,
                            Err(_) => {
                                warn!("Peer {} stalled for {:?}, dropping", peer_id, WRITE_TIMEOUT);
                                break;
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        // Skipped frames would leave this peer replaying a different log.
                        warn!("Peer {} lagged, {} frames skipped, disconnecting", peer_id, skipped);
                        let _ = tokio::time::timeout(WRITE_TIMEOUT, sender.send(lagged_close())).await;
                        break;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    state.leave_room(&room, &peer_id);
    info!("Connection closed: {} (room {})", peer_id, room);
}

/// Close frame sent to a peer that fell behind its room.
fn lagged_close() -> Message {
    Message::Close(Some(CloseFrame {
        code: close_code::AGAIN,
        reason: Utf8Bytes::from_static("fell behind the room, reconnect"),
    }))
}
