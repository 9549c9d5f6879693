//! External store publishing for liqflow.
//!
//! The pipeline publishes whole-record overwrites to a shared key-value
//! store: one window record per symbol per category under
//! `{category}:{symbol}`, and point-in-time funding rates under
//! `funding_rate:{symbol}`. The downstream strategy process treats every
//! record as a full replacement, never a delta.

pub mod error;
pub mod record;
pub mod redis_store;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use record::{format_timestamp, AggregateRecord, FundingRecord};
pub use redis_store::RedisStore;
pub use store::{BoxFuture, DynMarketStore, MarketStore, MemoryStore};
