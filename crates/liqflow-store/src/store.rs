//! Store trait for publishing aggregates.
//!
//! Trait-based abstraction over the external key-value store so the flush
//! scheduler and funding poller can be exercised in tests without a live
//! server.

use crate::error::{StoreError, StoreResult};
use crate::record::{AggregateRecord, FundingRecord};
use liqflow_core::{FeedCategory, Symbol};
use std::pin::Pin;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

/// Writable view of the external store.
///
/// Both write paths are whole-record overwrites; the windowed aggregates
/// and the funding rate deliberately stay separate so reset semantics
/// never leak onto the point-in-time record.
pub trait MarketStore: Send + Sync {
    /// Overwrite the window record under `{category}:{symbol}`.
    fn write_window(
        &self,
        category: FeedCategory,
        symbol: Symbol,
        record: AggregateRecord,
    ) -> BoxFuture<'_, StoreResult<()>>;

    /// Overwrite the funding record under `funding_rate:{symbol}`.
    fn write_funding(&self, symbol: Symbol, record: FundingRecord)
        -> BoxFuture<'_, StoreResult<()>>;

    /// Round-trip health check. Used once at boot; failure there is fatal.
    fn ping(&self) -> BoxFuture<'_, StoreResult<()>>;
}

/// Arc wrapper for MarketStore trait objects.
pub type DynMarketStore = Arc<dyn MarketStore>;

/// In-memory store for tests.
///
/// Records every write for verification and can be told to fail the next
/// N writes to exercise retry paths.
#[derive(Default)]
pub struct MemoryStore {
    windows: parking_lot::Mutex<Vec<(String, AggregateRecord)>>,
    funding: parking_lot::Mutex<Vec<(String, FundingRecord)>>,
    fail_writes: AtomicU32,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `n` writes with a simulated error.
    pub fn set_fail_writes(&self, n: u32) {
        self.fail_writes.store(n, Ordering::SeqCst);
    }

    /// Recorded window writes as `("{category}:{symbol}", record)` pairs.
    pub fn windows(&self) -> Vec<(String, AggregateRecord)> {
        self.windows.lock().clone()
    }

    /// Recorded funding writes as `("funding_rate:{symbol}", record)` pairs.
    pub fn funding(&self) -> Vec<(String, FundingRecord)> {
        self.funding.lock().clone()
    }

    fn take_failure(&self) -> bool {
        self.fail_writes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl MarketStore for MemoryStore {
    fn write_window(
        &self,
        category: FeedCategory,
        symbol: Symbol,
        record: AggregateRecord,
    ) -> BoxFuture<'_, StoreResult<()>> {
        Box::pin(async move {
            if self.take_failure() {
                return Err(StoreError::Write("simulated write failure".to_string()));
            }
            let key = format!("{}:{}", category.as_str(), symbol);
            self.windows.lock().push((key, record));
            Ok(())
        })
    }

    fn write_funding(
        &self,
        symbol: Symbol,
        record: FundingRecord,
    ) -> BoxFuture<'_, StoreResult<()>> {
        Box::pin(async move {
            if self.take_failure() {
                return Err(StoreError::Write("simulated write failure".to_string()));
            }
            let key = format!("funding_rate:{symbol}");
            self.funding.lock().push((key, record));
            Ok(())
        })
    }

    fn ping(&self) -> BoxFuture<'_, StoreResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use liqflow_core::WindowTotals;
    use rust_decimal_macros::dec;

    fn symbol() -> Symbol {
        Symbol::from_native("BTCUSDT").unwrap()
    }

    #[tokio::test]
    async fn test_memory_store_records_window_writes() {
        let store = MemoryStore::new();
        let record = AggregateRecord::from_totals(Utc::now(), &WindowTotals::default());

        store
            .write_window(FeedCategory::Liquidation, symbol(), record.clone())
            .await
            .unwrap();

        let writes = store.windows();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].0, "liquidation:BTCUSDT");
        assert_eq!(writes[0].1, record);
    }

    #[tokio::test]
    async fn test_memory_store_records_funding_writes() {
        let store = MemoryStore::new();
        let record = FundingRecord::new(dec!(0.0001), Utc::now());

        store.write_funding(symbol(), record).await.unwrap();

        let writes = store.funding();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].0, "funding_rate:BTCUSDT");
    }

    #[tokio::test]
    async fn test_memory_store_simulated_failures() {
        let store = MemoryStore::new();
        store.set_fail_writes(2);
        let record = AggregateRecord::from_totals(Utc::now(), &WindowTotals::default());

        for _ in 0..2 {
            let result = store
                .write_window(FeedCategory::LargeTrade, symbol(), record.clone())
                .await;
            assert!(result.is_err());
        }

        // Third write succeeds
        store
            .write_window(FeedCategory::LargeTrade, symbol(), record)
            .await
            .unwrap();
        assert_eq!(store.windows().len(), 1);
    }
}
