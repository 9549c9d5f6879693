//! Wall-clock-aligned window flushing.
//!
//! Every bucket is drained and published once per interval, aligned to
//! UTC wall-clock boundaries (a 60s interval fires at :00 of every
//! minute). One flush cycle runs to completion before the next is
//! scheduled.

use crate::store::{AggregationStore, BucketKey};
use chrono::{DateTime, Utc};
use liqflow_store::{AggregateRecord, DynMarketStore};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

const PUBLISH_ATTEMPTS: u32 = 3;
const RETRY_BASE_MS: u64 = 500;
const RETRY_MAX_MS: u64 = 5_000;

/// Time remaining until the next aligned interval boundary.
///
/// Computed from the UTC timestamp, so a 60s interval always fires at
/// :00 regardless of when the process started. Exactly on a boundary the
/// full interval is returned.
pub fn until_next_boundary(now: DateTime<Utc>, interval: Duration) -> Duration {
    let interval_ms = interval.as_millis() as i64;
    let elapsed = now.timestamp_millis().rem_euclid(interval_ms);
    Duration::from_millis((interval_ms - elapsed) as u64)
}

/// Drains every aggregation bucket on each interval boundary and
/// publishes the totals.
pub struct FlushScheduler {
    store: Arc<AggregationStore>,
    sink: DynMarketStore,
    interval: Duration,
    shutdown: CancellationToken,
}

impl FlushScheduler {
    pub fn new(
        store: Arc<AggregationStore>,
        sink: DynMarketStore,
        interval: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            store,
            sink,
            interval,
            shutdown,
        }
    }

    /// Run flush cycles until shutdown.
    pub async fn run(&self) {
        info!(interval_secs = self.interval.as_secs(), "Starting flush scheduler");

        loop {
            let wait = until_next_boundary(Utc::now(), self.interval);
            tokio::select! {
                () = tokio::time::sleep(wait) => {}
                () = self.shutdown.cancelled() => break,
            }

            self.flush_all(Utc::now()).await;
        }

        info!("Flush scheduler stopped");
    }

    /// Drain and publish every bucket, tagged with one flush timestamp.
    ///
    /// Zero windows are published too: downstream reads the record's
    /// timestamp to tell a quiet window from a stalled pipeline.
    pub async fn flush_all(&self, flushed_at: DateTime<Utc>) {
        let keys = self.store.bucket_keys();
        debug!(buckets = keys.len(), "Flushing windows");

        for key in keys {
            let Some(totals) = self.store.drain(&key) else {
                continue;
            };
            let record = AggregateRecord::from_totals(flushed_at, &totals);
            self.publish(&key, record).await;
        }
    }

    /// Publish one record with bounded retries.
    ///
    /// The bucket was already reset when we get here, so on final failure
    /// the window's totals are gone; that loss is logged explicitly
    /// rather than silently re-merged into the next window.
    async fn publish(&self, key: &BucketKey, record: AggregateRecord) {
        let mut delay_ms = RETRY_BASE_MS;

        for attempt in 1..=PUBLISH_ATTEMPTS {
            match self
                .sink
                .write_window(key.category, key.symbol.clone(), record.clone())
                .await
            {
                Ok(()) => return,
                Err(e) if attempt < PUBLISH_ATTEMPTS => {
                    warn!(
                        category = %key.category,
                        symbol = %key.symbol,
                        attempt,
                        error = %e,
                        "Window publish failed, retrying"
                    );
                    tokio::select! {
                        () = tokio::time::sleep(Duration::from_millis(delay_ms)) => {}
                        () = self.shutdown.cancelled() => {
                            error!(
                                category = %key.category,
                                symbol = %key.symbol,
                                "Shutdown during publish retry, window data lost"
                            );
                            return;
                        }
                    }
                    delay_ms = (delay_ms * 2).min(RETRY_MAX_MS);
                }
                Err(e) => {
                    error!(
                        category = %key.category,
                        symbol = %key.symbol,
                        attempts = PUBLISH_ATTEMPTS,
                        error = %e,
                        "Window publish failed after retries, window data lost"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use liqflow_core::{Direction, FeedCategory, Symbol, SymbolRegistry};
    use liqflow_store::MemoryStore;
    use rust_decimal_macros::dec;

    fn setup() -> (Arc<AggregationStore>, Arc<MemoryStore>, FlushScheduler) {
        let registry =
            Arc::new(SymbolRegistry::from_pairs(&["BTC/USDT".to_string()]).unwrap());
        let store = Arc::new(AggregationStore::new(&registry));
        let sink = Arc::new(MemoryStore::new());
        let scheduler = FlushScheduler::new(
            Arc::clone(&store),
            sink.clone() as DynMarketStore,
            Duration::from_secs(60),
            CancellationToken::new(),
        );
        (store, sink, scheduler)
    }

    fn btc() -> Symbol {
        Symbol::from_native("BTCUSDT").unwrap()
    }

    #[test]
    fn test_boundary_alignment() {
        let interval = Duration::from_secs(60);

        let mid = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 45).unwrap();
        assert_eq!(until_next_boundary(mid, interval), Duration::from_secs(15));

        let exact = Utc.with_ymd_and_hms(2024, 5, 1, 12, 31, 0).unwrap();
        assert_eq!(until_next_boundary(exact, interval), Duration::from_secs(60));
    }

    #[test]
    fn test_boundary_subminute_interval() {
        let interval = Duration::from_secs(10);
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 7).unwrap();
        assert_eq!(until_next_boundary(now, interval), Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_flush_publishes_all_buckets_including_zero() {
        let (store, sink, scheduler) = setup();
        store.record(&btc(), FeedCategory::Liquidation, Direction::Long, dec!(1500));

        let flushed_at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        scheduler.flush_all(flushed_at).await;

        let writes = sink.windows();
        // Both categories published, the quiet one as zeros
        assert_eq!(writes.len(), 2);

        let liq = writes
            .iter()
            .find(|(key, _)| key == "liquidation:BTCUSDT")
            .unwrap();
        assert_eq!(liq.1.long_count, 1);
        assert_eq!(liq.1.long_usd_size, dec!(1500));
        assert_eq!(liq.1.timestamp, "2024-05-01 12:00:00");

        let trades = writes
            .iter()
            .find(|(key, _)| key == "large_trade:BTCUSDT")
            .unwrap();
        assert_eq!(trades.1.long_count, 0);
        assert_eq!(trades.1.short_count, 0);
    }

    #[tokio::test]
    async fn test_flush_resets_buckets() {
        let (store, sink, scheduler) = setup();
        store.record(&btc(), FeedCategory::LargeTrade, Direction::Short, dec!(20000));

        scheduler.flush_all(Utc::now()).await;
        scheduler.flush_all(Utc::now()).await;

        let writes = sink.windows();
        assert_eq!(writes.len(), 4);
        // Second cycle publishes zeros for the same key
        let second = &writes[2..];
        assert!(second.iter().all(|(_, record)| record.short_count == 0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_publish_retries_transient_failure() {
        let (store, sink, scheduler) = setup();
        store.record(&btc(), FeedCategory::Liquidation, Direction::Long, dec!(100));
        sink.set_fail_writes(1);

        scheduler.flush_all(Utc::now()).await;

        // One write failed and was retried; both buckets still land
        assert_eq!(sink.windows().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_aborts_publish_retries() {
        let registry =
            Arc::new(SymbolRegistry::from_pairs(&["BTC/USDT".to_string()]).unwrap());
        let store = Arc::new(AggregationStore::new(&registry));
        let sink = Arc::new(MemoryStore::new());
        let shutdown = CancellationToken::new();
        let scheduler = FlushScheduler::new(
            Arc::clone(&store),
            sink.clone() as DynMarketStore,
            Duration::from_secs(60),
            shutdown.clone(),
        );

        store.record(&btc(), FeedCategory::Liquidation, Direction::Long, dec!(100));
        sink.set_fail_writes(u32::MAX);
        shutdown.cancel();

        let start = tokio::time::Instant::now();
        scheduler.flush_all(Utc::now()).await;

        // No retry sleeps ran: virtual time did not advance
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert!(sink.windows().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_publish_gives_up_after_bounded_retries() {
        let (store, sink, scheduler) = setup();
        store.record(&btc(), FeedCategory::Liquidation, Direction::Long, dec!(100));
        // Fail every attempt for both buckets
        sink.set_fail_writes(PUBLISH_ATTEMPTS * 2);

        scheduler.flush_all(Utc::now()).await;
        assert!(sink.windows().is_empty());

        // Drained totals are not re-merged: the next window starts clean
        let key = BucketKey {
            symbol: btc(),
            category: FeedCategory::Liquidation,
        };
        assert!(store.drain(&key).unwrap().is_zero());
    }
}
