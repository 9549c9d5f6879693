//! Forced-liquidation feed consumer.
//!
//! One multiplexed stream carries liquidations for every market on the
//! exchange; events for untracked symbols are dropped here.

use crate::parser::parse_liquidation;
use crate::store::AggregationStore;
use liqflow_core::{FeedCategory, SymbolRegistry};
use liqflow_ws::{ConnectionConfig, ConnectionManager};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const MESSAGE_BUFFER: usize = 1024;

/// Consumer for the exchange-wide forced-liquidation stream.
pub struct LiquidationConsumer {
    registry: Arc<SymbolRegistry>,
    store: Arc<AggregationStore>,
    manager: Arc<ConnectionManager>,
    message_rx: mpsc::Receiver<String>,
    shutdown: CancellationToken,
    /// Untracked symbols already logged, so a busy market is noted once.
    unknown_symbols: HashSet<String>,
}

impl LiquidationConsumer {
    pub fn new(
        connection: ConnectionConfig,
        registry: Arc<SymbolRegistry>,
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
            registry,
            store,
            manager,
            message_rx,
            shutdown,
            unknown_symbols: HashSet::new(),
        }
    }

    /// Run the transport and the consume loop until shutdown.
    pub async fn run(mut self) {
        info!("Starting liquidation consumer");

        let manager = Arc::clone(&self.manager);
        let connection_task = tokio::spawn(async move { manager.run().await });

        loop {
            tokio::select! {
                msg = self.message_rx.recv() => {
                    match msg {
                        Some(raw) => self.handle_message(&raw),
                        None => {
                            warn!("Liquidation message channel closed");
                            break;
                        }
                    }
                }
                () = self.shutdown.cancelled() => break,
            }
        }

        let _ = connection_task.await;
        info!("Liquidation consumer stopped");
    }

    /// Classify and record one raw frame. Bad frames are skipped.
    fn handle_message(&mut self, raw: &str) {
        let event = match parse_liquidation(raw) {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, "Skipping malformed liquidation message");
                return;
            }
        };

        let Some(symbol) = self.registry.resolve(&event.symbol) else {
            if self.unknown_symbols.insert(event.symbol.clone()) {
                debug!(symbol = %event.symbol, "Ignoring liquidations for untracked symbol");
            }
            return;
        };

        self.store.record(
            &symbol,
            FeedCategory::Liquidation,
            event.direction,
            event.usd_size,
        );
        debug!(
            symbol = %symbol,
            direction = %event.direction,
            usd_size = %event.usd_size,
            "Recorded liquidation"
        );
    }
}
