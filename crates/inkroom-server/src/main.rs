//! Inkroom WebSocket Relay Server
//!
//! Configuration comes from the environment:
//! - `INKROOM_RELAY_ADDR` listen address (default `0.0.0.0:8080`)
//! - `INKROOM_ROOM_CAPACITY` frames buffered per room (default 256)
//! - `RUST_LOG` log filter (default `inkroom_server=info,tower_http=info`)

use inkroom_server::{RelayConfig, RelayError};

#[tokio::main]
async fn main() -> Result<(), RelayError> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "inkroom_server=info,tower_http=info".into()),
        )
        .init();

    let config = RelayConfig::from_env()?;
    inkroom_server::serve(config).await
}
