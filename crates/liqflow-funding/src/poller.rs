//! Hourly funding-rate poll loop.

use crate::client::FundingClient;
use chrono::{DateTime, Utc};
use liqflow_core::SymbolRegistry;
use liqflow_store::{DynMarketStore, FundingRecord};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Polls funding rates on a fixed interval and writes the latest rate per
/// tracked symbol straight to the store. No windowing: each poll
/// overwrites the previous record, and a failed cycle just leaves the
/// previous record standing.
pub struct FundingPoller {
    client: FundingClient,
    registry: Arc<SymbolRegistry>,
    sink: DynMarketStore,
    interval: Duration,
    shutdown: CancellationToken,
}

impl FundingPoller {
    pub fn new(
        client: FundingClient,
        registry: Arc<SymbolRegistry>,
        sink: DynMarketStore,
        interval: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            client,
            registry,
            sink,
            interval,
            shutdown,
        }
    }

    /// Run poll cycles until shutdown. The first poll fires immediately.
    pub async fn run(&self) {
        info!(interval_secs = self.interval.as_secs(), "Starting funding poller");

        loop {
            self.poll_once().await;

            tokio::select! {
                () = tokio::time::sleep(self.interval) => {}
                () = self.shutdown.cancelled() => break,
            }
        }

        info!("Funding poller stopped");
    }

    /// One poll cycle. Fetch failure abandons the cycle; staleness is
    /// tolerated until the next interval.
    async fn poll_once(&self) {
        match self.client.fetch_rates(&self.shutdown).await {
            Ok(rates) => self.store_rates(&rates, Utc::now()).await,
            Err(crate::error::FundingError::Cancelled) => {
                debug!("Funding fetch cancelled by shutdown");
            }
            Err(e) => {
                error!(error = %e, "Funding poll cycle failed, keeping previous rates");
            }
        }
    }

    /// Write the fetched rate for every tracked symbol present in the
    /// response. Per-symbol write failures are logged and skipped.
    async fn store_rates(&self, rates: &HashMap<String, Decimal>, observed_at: DateTime<Utc>) {
        let mut written = 0usize;

        for symbol in self.registry.iter() {
            let Some(rate) = rates.get(symbol.as_str()) else {
                debug!(symbol = %symbol, "No funding rate in response");
                continue;
            };

            let record = FundingRecord::new(*rate, observed_at);
            if let Err(e) = self.sink.write_funding(symbol.clone(), record).await {
                warn!(symbol = %symbol, error = %e, "Funding rate write failed");
            } else {
                written += 1;
            }
        }

        info!(written, tracked = self.registry.len(), "Stored funding rates");
    }
}
