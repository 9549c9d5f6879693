//! Redis implementation of the market store.

use crate::error::StoreResult;
use crate::record::{AggregateRecord, FundingRecord};
use crate::store::{BoxFuture, MarketStore};
use liqflow_core::{FeedCategory, Symbol};
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use tracing::{debug, info};

/// Redis-backed store.
///
/// Uses a multiplexed connection shared across tasks; every record is a
/// single `HSET` overwriting all fields of the key.
pub struct RedisStore {
    conn: MultiplexedConnection,
}

impl RedisStore {
    /// Connect to Redis.
    pub async fn connect(url: &str) -> StoreResult<Self> {
        info!(url = %url, "Connecting to Redis");
        let client = redis::Client::open(url)?;
        let conn = client.get_multiplexed_async_connection().await?;
        Ok(Self { conn })
    }
}

impl MarketStore for RedisStore {
    fn write_window(
        &self,
        category: FeedCategory,
        symbol: Symbol,
        record: AggregateRecord,
    ) -> BoxFuture<'_, StoreResult<()>> {
        let mut conn = self.conn.clone();
        Box::pin(async move {
            let key = format!("{}:{}", category.as_str(), symbol);
            let fields = record.fields();
            let _: () = conn.hset_multiple(&key, &fields).await?;
            debug!(key = %key, "Window record published");
            Ok(())
        })
    }

    fn write_funding(
        &self,
        symbol: Symbol,
        record: FundingRecord,
    ) -> BoxFuture<'_, StoreResult<()>> {
        let mut conn = self.conn.clone();
        Box::pin(async move {
            let key = format!("funding_rate:{symbol}");
            let fields = record.fields();
            let _: () = conn.hset_multiple(&key, &fields).await?;
            debug!(key = %key, "Funding record published");
            Ok(())
        })
    }

    fn ping(&self) -> BoxFuture<'_, StoreResult<()>> {
        let mut conn = self.conn.clone();
        Box::pin(async move {
            let _: String = redis::cmd("PING").query_async(&mut conn).await?;
            Ok(())
        })
    }
}
