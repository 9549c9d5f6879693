//! WebSocket connection manager.
//!
//! Owns one logical stream connection for the process lifetime. Connection
//! attempts are grouped into cycles: within a cycle, failed attempts back
//! off exponentially (capped, jittered) up to a bounded count; an exhausted
//! cycle is logged and restarted after a cool-down, so the logical
//! connection is retried indefinitely until shutdown.

use crate::error::{WsError, WsResult};
use crate::heartbeat::Heartbeat;
use futures_util::{SinkExt, StreamExt};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;
use tokio_tungstenite::{connect_async_tls_with_config, tungstenite::Message};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Connection configuration.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// WebSocket URL.
    pub url: String,
    /// Maximum connection attempts per cycle.
    pub max_attempts_per_cycle: u32,
    /// Base delay for exponential backoff (ms).
    pub backoff_base_ms: u64,
    /// Maximum backoff delay (ms).
    pub backoff_max_ms: u64,
    /// Cool-down between exhausted cycles (ms).
    pub cycle_cooldown_ms: u64,
    /// Keepalive probe interval (ms).
    pub ping_interval_ms: u64,
    /// Pong timeout (ms).
    pub pong_timeout_ms: u64,
    /// Maximum inbound message size (bytes).
    pub max_message_bytes: usize,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_attempts_per_cycle: 5,
            backoff_base_ms: 5_000,
            backoff_max_ms: 60_000,
            cycle_cooldown_ms: 5_000,
            ping_interval_ms: 20_000,
            pong_timeout_ms: 10_000,
            max_message_bytes: 1 << 20, // 1 MiB
        }
    }
}

/// Connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Streaming,
    Backoff,
}

/// Outcome of one attempt cycle.
enum CycleOutcome {
    Cancelled,
    Exhausted { attempts: u32 },
}

/// WebSocket connection manager.
///
/// Forwards raw text frames to the owning consumer over an mpsc channel;
/// parsing and classification stay on the consumer side so a bad message
/// never tears down the transport.
pub struct ConnectionManager {
    config: ConnectionConfig,
    state: Arc<RwLock<ConnectionState>>,
    heartbeat: Heartbeat,
    message_tx: mpsc::Sender<String>,
    shutdown: CancellationToken,
}

impl ConnectionManager {
    /// Create a new connection manager.
    pub fn new(
        config: ConnectionConfig,
        message_tx: mpsc::Sender<String>,
        shutdown: CancellationToken,
    ) -> Self {
        let heartbeat = Heartbeat::new(config.ping_interval_ms, config.pong_timeout_ms);
        Self {
            config,
            state: Arc::new(RwLock::new(ConnectionState::Disconnected)),
            heartbeat,
            message_tx,
            shutdown,
        }
    }

    /// Get current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    /// Run the connection until shutdown.
    ///
    /// Never returns while the process runs: an exhausted attempt cycle is
    /// logged and restarted after the configured cool-down.
    pub async fn run(&self) {
        loop {
            match self.run_cycle().await {
                CycleOutcome::Cancelled => {
                    info!(url = %self.config.url, "Connection shut down");
                    *self.state.write() = ConnectionState::Disconnected;
                    return;
                }
                CycleOutcome::Exhausted { attempts } => {
                    error!(
                        url = %self.config.url,
                        attempts,
                        cooldown_ms = self.config.cycle_cooldown_ms,
                        "Connection attempts exhausted, restarting cycle after cool-down"
                    );
                    *self.state.write() = ConnectionState::Disconnected;

                    tokio::select! {
                        () = tokio::time::sleep(Duration::from_millis(self.config.cycle_cooldown_ms)) => {}
                        () = self.shutdown.cancelled() => {
                            *self.state.write() = ConnectionState::Disconnected;
                            return;
                        }
                    }
                }
            }
        }
    }

    /// Run one bounded attempt cycle.
    async fn run_cycle(&self) -> CycleOutcome {
        let mut attempt = 0u32;

        loop {
            if self.shutdown.is_cancelled() {
                return CycleOutcome::Cancelled;
            }

            *self.state.write() = ConnectionState::Connecting;

            match self.stream_once(&mut attempt).await {
                Ok(()) => {
                    info!(url = %self.config.url, "WebSocket connection closed");
                }
                Err(e) => {
                    warn!(url = %self.config.url, error = %e, "WebSocket connection error");
                }
            }

            if self.shutdown.is_cancelled() {
                return CycleOutcome::Cancelled;
            }

            attempt += 1;
            if attempt >= self.config.max_attempts_per_cycle {
                return CycleOutcome::Exhausted { attempts: attempt };
            }

            *self.state.write() = ConnectionState::Backoff;
            let delay = self.backoff_delay(attempt);
            warn!(
                url = %self.config.url,
                attempt,
                delay_ms = delay.as_millis(),
                "Reconnecting"
            );

            tokio::select! {
                () = tokio::time::sleep(delay) => {}
                () = self.shutdown.cancelled() => return CycleOutcome::Cancelled,
            }
        }
    }

    /// Connect once and pump frames until the connection ends.
    ///
    /// Resets the cycle attempt counter as soon as the handshake succeeds,
    /// so a long-lived connection that later drops starts a fresh backoff
    /// sequence.
    async fn stream_once(&self, attempt: &mut u32) -> WsResult<()> {
        info!(url = %self.config.url, "Connecting to WebSocket");

        // Compression stays off (tungstenite does not negotiate
        // permessage-deflate); only the size limits are tightened.
        let ws_config = WebSocketConfig {
            max_message_size: Some(self.config.max_message_bytes),
            max_frame_size: Some(self.config.max_message_bytes),
            ..Default::default()
        };

        let (ws_stream, _response) =
            connect_async_tls_with_config(&self.config.url, Some(ws_config), true, None).await?;

        *self.state.write() = ConnectionState::Connected;
        *attempt = 0;
        self.heartbeat.reset();
        info!(url = %self.config.url, "WebSocket connected");

        let (mut write, mut read) = ws_stream.split();

        loop {
            tokio::select! {
                // Shutdown: attempt a clean close, then bail out
                () = self.shutdown.cancelled() => {
                    if let Err(e) = write.send(Message::Close(None)).await {
                        debug!(error = %e, "Failed to send Close frame during shutdown");
                    }
                    *self.state.write() = ConnectionState::Disconnected;
                    return Ok(());
                }

                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            self.heartbeat.record_activity();
                            if *self.state.read() == ConnectionState::Connected {
                                *self.state.write() = ConnectionState::Streaming;
                            }
                            if self.message_tx.send(text).await.is_err() {
                                warn!("Message receiver dropped, closing connection");
                                return Ok(());
                            }
                        }
                        Some(Ok(Message::Ping(data))) => {
                            self.heartbeat.record_activity();
                            write.send(Message::Pong(data)).await?;
                        }
                        Some(Ok(Message::Pong(_))) => {
                            self.heartbeat.record_pong();
                        }
                        Some(Ok(Message::Close(frame))) => {
                            let (code, reason) = frame
                                .map(|f| (f.code.into(), f.reason.to_string()))
                                .unwrap_or((1000, "Normal close".to_string()));
                            warn!(code, %reason, "WebSocket closed by server");
                            return Err(WsError::ConnectionClosed { code, reason });
                        }
                        Some(Err(e)) => {
                            error!(error = %e, "WebSocket read error");
                            return Err(e.into());
                        }
                        None => {
                            warn!("WebSocket stream ended");
                            return Ok(());
                        }
                        _ => {}
                    }
                }

                _ = self.heartbeat.wait_for_check() => {
                    if self.heartbeat.is_timed_out() {
                        error!(url = %self.config.url, "Keepalive timeout");
                        return Err(WsError::KeepaliveTimeout);
                    }

                    if self.heartbeat.should_send_ping() {
                        write.send(Message::Ping(Vec::new())).await?;
                        self.heartbeat.record_ping();
                        debug!("Sent keepalive ping");
                    }
                }
            }
        }
    }

    /// Deterministic backoff component: base * 2^(attempt-1), capped.
    fn backoff_delay_ms(&self, attempt: u32) -> u64 {
        let exponent = attempt.saturating_sub(1).min(10);
        self.config
            .backoff_base_ms
            .saturating_mul(1u64 << exponent)
            .min(self.config.backoff_max_ms)
    }

    fn backoff_delay(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.backoff_delay_ms(attempt) + rand_jitter())
    }
}

/// Generate random jitter (0-1000ms).
fn rand_jitter() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    (nanos % 1000) as u64
}
