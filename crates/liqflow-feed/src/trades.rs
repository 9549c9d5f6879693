//! Per-symbol trade feed consumer.
//!
//! Each tracked symbol gets its own stream connection. Trades below the
//! USD threshold are discarded before classification; the rest accumulate
//! into the symbol's large-trade bucket.

use crate::parser::parse_trade;
use crate::store::AggregationStore;
use liqflow_core::{FeedCategory, Symbol};
use liqflow_ws::{ConnectionConfig, ConnectionManager};
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const MESSAGE_BUFFER: usize = 1024;

/// Minimum notional for a trade to count as large.
#[derive(Debug, Clone, Copy)]
pub struct TradeThreshold {
    pub usd: Decimal,
    /// When true a trade exactly at the threshold is accepted.
    pub inclusive: bool,
}

impl TradeThreshold {
    pub fn accepts(&self, usd_size: Decimal) -> bool {
        if self.inclusive {
            usd_size >= self.usd
        } else {
            usd_size > self.usd
        }
    }
}

/// Consumer for one symbol's aggregated-trade stream.
pub struct TradeConsumer {
    symbol: Symbol,
    threshold: TradeThreshold,
    store: Arc<AggregationStore>,
    manager: Arc<ConnectionManager>,
    message_rx: mpsc::Receiver<String>,
    shutdown: CancellationToken,
}

impl TradeConsumer {
    pub fn new(
        symbol: Symbol,
        threshold: TradeThreshold,
        connection: ConnectionConfig,
        store: Arc<AggregationStore>,
        shutdown: CancellationToken,
    ) -> Self {
        let (message_tx, message_rx) = mpsc::channel(MESSAGE_BUFFER);
        let manager = Arc::new(ConnectionManager::new(
            connection,
            message_tx,
            shutdown.clone(),
        ));
        Self {
            symbol,
            threshold,
            store,
            manager,
            message_rx,
            shutdown,
        }
    }

    /// Run the transport and the consume loop until shutdown.
    pub async fn run(mut self) {
        info!(symbol = %self.symbol, "Starting trade consumer");

        let manager = Arc::clone(&self.manager);
        let connection_task = tokio::spawn(async move { manager.run().await });

        loop {
            tokio::select! {
                msg = self.message_rx.recv() => {
                    match msg {
                        Some(raw) => self.handle_message(&raw),
                        None => {
                            warn!(symbol = %self.symbol, "Trade message channel closed");
                            break;
                        }
                    }
                }
                () = self.shutdown.cancelled() => break,
            }
        }

        let _ = connection_task.await;
        info!(symbol = %self.symbol, "Trade consumer stopped");
    }

    /// Classify and record one raw frame. Bad frames are skipped.
    fn handle_message(&self, raw: &str) {
        let event = match parse_trade(raw) {
            Ok(event) => event,
            Err(e) => {
                warn!(symbol = %self.symbol, error = %e, "Skipping malformed trade message");
                return;
            }
        };

        if !self.threshold.accepts(event.usd_size) {
            return;
        }

        self.store.record(
            &self.symbol,
            FeedCategory::LargeTrade,
            event.direction,
            event.usd_size,
        );
        debug!(
            symbol = %self.symbol,
            direction = %event.direction,
            usd_size = %event.usd_size,
            "Recorded large trade"
        );
    }
}
