//! WebSocket stream connections for liqflow feed consumers.
//!
//! Provides robust connectivity with:
//! - Bounded retry cycles with capped exponential backoff and jitter
//! - Indefinite cycle restarts (a logical connection is never abandoned)
//! - Keepalive ping/pong monitoring with activity timeout
//! - Channel-based fan-out of raw text frames to the owning consumer

pub mod connection;
pub mod error;
pub mod heartbeat;

pub use connection::{ConnectionConfig, ConnectionManager, ConnectionState};
pub use error::{WsError, WsResult};
pub use heartbeat::Heartbeat;

use std::sync::Once;

static INIT_CRYPTO: Once = Once::new();

/// Initialize the TLS crypto provider.
/// Must be called before any WebSocket connections are made.
pub fn init_crypto() {
    INIT_CRYPTO.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}
