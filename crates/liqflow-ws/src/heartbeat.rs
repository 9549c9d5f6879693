//! Keepalive management for WebSocket connections.
//!
//! Tracks ping/pong timing and inbound activity so the connection loop can
//! decide when to probe the peer and when to declare the link dead.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::time::Duration;
use tracing::debug;

/// Keepalive state for one WebSocket connection attempt.
pub struct Heartbeat {
    /// How often to probe when the link is quiet (ms).
    interval_ms: u64,
    /// How long to wait for a pong before declaring timeout (ms).
    timeout_ms: u64,
    last_ping: RwLock<Option<DateTime<Utc>>>,
    last_activity: RwLock<DateTime<Utc>>,
    waiting_for_pong: RwLock<bool>,
}

impl Heartbeat {
    pub fn new(interval_ms: u64, timeout_ms: u64) -> Self {
        Self {
            interval_ms,
            timeout_ms,
            last_ping: RwLock::new(None),
            last_activity: RwLock::new(Utc::now()),
            waiting_for_pong: RwLock::new(false),
        }
    }

    /// Reset keepalive state (called on every successful connect).
    pub fn reset(&self) {
        *self.last_ping.write() = None;
        *self.last_activity.write() = Utc::now();
        *self.waiting_for_pong.write() = false;
    }

    /// Record that a ping was sent.
    pub fn record_ping(&self) {
        *self.last_ping.write() = Some(Utc::now());
        *self.waiting_for_pong.write() = true;
    }

    /// Record that a pong was received.
    pub fn record_pong(&self) {
        let now = Utc::now();
        *self.waiting_for_pong.write() = false;
        if let Some(ping_time) = *self.last_ping.read() {
            let rtt_ms = (now - ping_time).num_milliseconds();
            debug!(rtt_ms, "Received pong");
        }
        *self.last_activity.write() = now;
    }

    /// Record that any inbound frame was received.
    pub fn record_activity(&self) {
        *self.last_activity.write() = Utc::now();
    }

    /// Check if an outstanding ping has gone unanswered past the timeout.
    pub fn is_timed_out(&self) -> bool {
        if !*self.waiting_for_pong.read() {
            return false;
        }

        if let Some(ping_time) = *self.last_ping.read() {
            let elapsed_ms = (Utc::now() - ping_time).num_milliseconds();
            return elapsed_ms > self.timeout_ms as i64;
        }

        false
    }

    /// Get time since the last inbound frame.
    pub fn time_since_activity_ms(&self) -> i64 {
        (Utc::now() - *self.last_activity.read()).num_milliseconds()
    }

    /// Check if the link has been quiet long enough to warrant a probe.
    pub fn should_send_ping(&self) -> bool {
        // Don't stack probes while one is outstanding
        if *self.waiting_for_pong.read() {
            return false;
        }

        self.time_since_activity_ms() >= self.interval_ms as i64
    }

    /// Wait until the next keepalive check.
    pub async fn wait_for_check(&self) {
        tokio::time::sleep(Duration::from_millis(self.interval_ms / 2)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let hb = Heartbeat::new(20_000, 10_000);
        assert!(!hb.is_timed_out());
        assert!(!hb.should_send_ping());
    }

    #[test]
    fn test_ping_pong_cycle() {
        let hb = Heartbeat::new(20_000, 10_000);

        hb.record_ping();
        assert!(*hb.waiting_for_pong.read());
        // Fresh ping is not yet a timeout
        assert!(!hb.is_timed_out());

        hb.record_pong();
        assert!(!*hb.waiting_for_pong.read());
    }

    #[test]
    fn test_outstanding_ping_times_out() {
        // Zero timeout: any outstanding ping counts as timed out
        let hb = Heartbeat::new(20_000, 0);
        hb.record_ping();
        std::thread::sleep(Duration::from_millis(5));
        assert!(hb.is_timed_out());
    }

    #[test]
    fn test_quiet_link_wants_probe() {
        let hb = Heartbeat::new(0, 10_000);
        std::thread::sleep(Duration::from_millis(5));
        assert!(hb.should_send_ping());

        // No probe while one is outstanding
        hb.record_ping();
        assert!(!hb.should_send_ping());
    }
}
