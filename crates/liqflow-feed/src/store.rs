//! Per-symbol, per-category window accumulation.
//!
//! The bucket map is built once at startup for every tracked symbol and
//! both categories, so the recording hot path never allocates map entries
//! and the flush scheduler always publishes the full key set, zeros
//! included.

use dashmap::DashMap;
use liqflow_core::{Direction, FeedCategory, Symbol, SymbolRegistry, WindowTotals};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::sync::Arc;

/// Bucket identity: one per tracked symbol and category.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BucketKey {
    pub symbol: Symbol,
    pub category: FeedCategory,
}

/// Concurrent store of window accumulators.
///
/// Each bucket carries its own lock; recording and draining touch exactly
/// one bucket, so the two feeds and the flush scheduler never contend on
/// a global lock.
pub struct AggregationStore {
    buckets: DashMap<BucketKey, Arc<Mutex<WindowTotals>>>,
}

impl AggregationStore {
    /// Build the fixed bucket set for a symbol registry.
    pub fn new(registry: &SymbolRegistry) -> Self {
        let buckets = DashMap::new();
        for symbol in registry.iter() {
            for category in FeedCategory::ALL {
                let key = BucketKey {
                    symbol: symbol.clone(),
                    category,
                };
                buckets.insert(key, Arc::new(Mutex::new(WindowTotals::default())));
            }
        }
        Self { buckets }
    }

    /// Add one classified event to its bucket.
    ///
    /// Returns false when the symbol/category pair is not tracked; the
    /// caller decides whether that is worth logging.
    pub fn record(
        &self,
        symbol: &Symbol,
        category: FeedCategory,
        direction: Direction,
        usd_size: Decimal,
    ) -> bool {
        let key = BucketKey {
            symbol: symbol.clone(),
            category,
        };
        match self.buckets.get(&key) {
            Some(bucket) => {
                bucket.lock().record(direction, usd_size);
                true
            }
            None => false,
        }
    }

    /// Atomically take the bucket's totals and reset it to zero.
    ///
    /// The swap happens under the bucket lock, so an increment lands
    /// either in the drained value or in the fresh window, never in both
    /// and never in neither.
    pub fn drain(&self, key: &BucketKey) -> Option<WindowTotals> {
        self.buckets
            .get(key)
            .map(|bucket| std::mem::take(&mut *bucket.lock()))
    }

    /// Snapshot of all bucket keys, for the flush scheduler.
    pub fn bucket_keys(&self) -> Vec<BucketKey> {
        self.buckets.iter().map(|e| e.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn registry() -> SymbolRegistry {
        SymbolRegistry::from_pairs(&["BTC/USDT".to_string(), "ETH/USDT".to_string()]).unwrap()
    }

    fn btc() -> Symbol {
        Symbol::from_native("BTCUSDT").unwrap()
    }

    #[test]
    fn test_buckets_prepopulated_for_all_categories() {
        let store = AggregationStore::new(&registry());
        // 2 symbols x 2 categories
        assert_eq!(store.len(), 4);

        let keys = store.bucket_keys();
        assert!(keys.contains(&BucketKey {
            symbol: btc(),
            category: FeedCategory::Liquidation,
        }));
        assert!(keys.contains(&BucketKey {
            symbol: btc(),
            category: FeedCategory::LargeTrade,
        }));
    }

    #[test]
    fn test_record_accumulates_into_one_bucket() {
        let store = AggregationStore::new(&registry());
        assert!(store.record(&btc(), FeedCategory::Liquidation, Direction::Long, dec!(100)));
        assert!(store.record(&btc(), FeedCategory::Liquidation, Direction::Long, dec!(50)));
        assert!(store.record(&btc(), FeedCategory::Liquidation, Direction::Short, dec!(25)));

        let key = BucketKey {
            symbol: btc(),
            category: FeedCategory::Liquidation,
        };
        let totals = store.drain(&key).unwrap();
        assert_eq!(totals.long_count, 2);
        assert_eq!(totals.long_usd_size, dec!(150));
        assert_eq!(totals.short_count, 1);
        assert_eq!(totals.short_usd_size, dec!(25));

        // Other category untouched
        let other = store
            .drain(&BucketKey {
                symbol: btc(),
                category: FeedCategory::LargeTrade,
            })
            .unwrap();
        assert!(other.is_zero());
    }

    #[test]
    fn test_drain_resets_to_zero() {
        let store = AggregationStore::new(&registry());
        store.record(&btc(), FeedCategory::LargeTrade, Direction::Short, dec!(9999));

        let key = BucketKey {
            symbol: btc(),
            category: FeedCategory::LargeTrade,
        };
        let first = store.drain(&key).unwrap();
        assert_eq!(first.short_count, 1);

        let second = store.drain(&key).unwrap();
        assert!(second.is_zero());
    }

    #[test]
    fn test_concurrent_record_and_drain_accounts_for_every_event() {
        let store = Arc::new(AggregationStore::new(&registry()));
        let key = BucketKey {
            symbol: btc(),
            category: FeedCategory::Liquidation,
        };

        const WRITERS: usize = 4;
        const EVENTS_PER_WRITER: u64 = 10_000;

        let writers: Vec<_> = (0..WRITERS)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for _ in 0..EVENTS_PER_WRITER {
                        store.record(&btc(), FeedCategory::Liquidation, Direction::Long, dec!(1));
                    }
                })
            })
            .collect();

        // Drain concurrently while the writers are still recording
        let drainer = {
            let store = Arc::clone(&store);
            let key = key.clone();
            std::thread::spawn(move || {
                let mut collected = WindowTotals::default();
                for _ in 0..1_000 {
                    if let Some(totals) = store.drain(&key) {
                        collected.long_count += totals.long_count;
                        collected.long_usd_size += totals.long_usd_size;
                    }
                }
                collected
            })
        };

        for writer in writers {
            writer.join().unwrap();
        }
        let mut collected = drainer.join().unwrap();
        let residual = store.drain(&key).unwrap();
        collected.long_count += residual.long_count;
        collected.long_usd_size += residual.long_usd_size;

        // Every increment landed in exactly one drained window
        let expected = WRITERS as u64 * EVENTS_PER_WRITER;
        assert_eq!(collected.long_count, expected);
        assert_eq!(collected.long_usd_size, Decimal::from(expected));
    }

    #[test]
    fn test_record_untracked_symbol_rejected() {
        let store = AggregationStore::new(&registry());
        let unknown = Symbol::from_native("DOGEUSDT").unwrap();
        assert!(!store.record(&unknown, FeedCategory::Liquidation, Direction::Long, dec!(1)));
    }
}
