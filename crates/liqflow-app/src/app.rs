//! Application orchestration.
//!
//! Wires the feeds, the poller and the scheduler to one shared
//! aggregation store and one Redis connection, then runs until ctrl-c.

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use liqflow_core::SymbolRegistry;
use liqflow_feed::{AggregationStore, FlushScheduler, LiquidationConsumer, TradeConsumer, TradeThreshold};
use liqflow_funding::{FundingClient, FundingPoller};
use liqflow_store::{DynMarketStore, MarketStore, RedisStore};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// The liqflow pipeline.
pub struct Application {
    config: AppConfig,
    registry: Arc<SymbolRegistry>,
}

impl Application {
    pub fn new(config: AppConfig) -> AppResult<Self> {
        // Zero intervals make no schedulable boundary; reject at boot.
        if config.aggregation_interval_secs == 0 {
            return Err(AppError::Config(
                "aggregation_interval_secs must be greater than zero".to_string(),
            ));
        }
        if config.funding_poll_interval_secs == 0 {
            return Err(AppError::Config(
                "funding_poll_interval_secs must be greater than zero".to_string(),
            ));
        }

        let registry = Arc::new(SymbolRegistry::from_pairs(&config.pairs)?);
        info!(symbols = registry.len(), "Symbol registry built");
        Ok(Self { config, registry })
    }

    /// Run the pipeline until a shutdown signal arrives.
    pub async fn run(self) -> AppResult<()> {
        // Store must be reachable at boot; a dead store later is retried
        // per write instead.
        let redis = RedisStore::connect(&self.config.redis_url).await?;
        redis.ping().await?;
        info!(url = %self.config.redis_url, "Redis store ready");
        let sink: DynMarketStore = Arc::new(redis);

        let store = Arc::new(AggregationStore::new(&self.registry));
        let shutdown = CancellationToken::new();
        let mut handles: Vec<JoinHandle<()>> = Vec::new();

        // Exchange-wide liquidation stream
        let liquidations = LiquidationConsumer::new(
            self.config
                .websocket
                .connection_config(self.config.liquidation_url.clone()),
            Arc::clone(&self.registry),
            Arc::clone(&store),
            shutdown.clone(),
        );
        handles.push(tokio::spawn(liquidations.run()));

        // One trade stream per tracked symbol
        let threshold = TradeThreshold {
            usd: self.config.large_trade_threshold_usd,
            inclusive: self.config.large_trade_threshold_inclusive,
        };
        for symbol in self.registry.iter() {
            let consumer = TradeConsumer::new(
                symbol.clone(),
                threshold,
                self.config
                    .websocket
                    .connection_config(self.config.trade_stream_url(symbol)),
                Arc::clone(&store),
                shutdown.clone(),
            );
            handles.push(tokio::spawn(consumer.run()));
        }

        // Hourly funding poll
        let client = FundingClient::new(
            self.config.funding_url.clone(),
            self.config.funding_max_retries,
        )?;
        let poller = FundingPoller::new(
            client,
            Arc::clone(&self.registry),
            Arc::clone(&sink),
            self.config.funding_poll_interval(),
            shutdown.clone(),
        );
        handles.push(tokio::spawn(async move { poller.run().await }));

        // Window flushing
        let scheduler = FlushScheduler::new(
            Arc::clone(&store),
            Arc::clone(&sink),
            self.config.aggregation_interval(),
            shutdown.clone(),
        );
        handles.push(tokio::spawn(async move { scheduler.run().await }));

        info!(tasks = handles.len(), "Pipeline running");

        tokio::signal::ctrl_c().await?;
        info!("Shutdown signal received");
        shutdown.cancel();

        for handle in handles {
            if let Err(e) = handle.await {
                error!(error = %e, "Task join failed");
            }
        }

        info!("Pipeline stopped");
        Ok(())
    }
}
