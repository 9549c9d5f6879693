//! REST client for the premium-index endpoint.

use crate::error::{FundingError, FundingResult};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const RETRY_BASE_MS: u64 = 1_000;
const RETRY_MAX_MS: u64 = 10_000;

/// One market's entry in the premium-index response.
#[derive(Debug, Deserialize)]
pub struct PremiumIndexEntry {
    pub symbol: String,
    #[serde(rename = "lastFundingRate")]
    pub last_funding_rate: String,
}

/// HTTP client for funding rates.
pub struct FundingClient {
    http: reqwest::Client,
    url: String,
    max_retries: u32,
}

impl FundingClient {
    pub fn new(url: String, max_retries: u32) -> FundingResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            url,
            max_retries,
        })
    }

    /// Fetch the current funding rate for every market, keyed by
    /// exchange-native symbol.
    ///
    /// Retries transient failures with capped backoff; an exhausted cycle
    /// is an error the caller treats as a skipped poll, never fatal.
    /// Shutdown interrupts the backoff sleeps.
    pub async fn fetch_rates(
        &self,
        shutdown: &CancellationToken,
    ) -> FundingResult<HashMap<String, Decimal>> {
        let mut delay_ms = RETRY_BASE_MS;

        for attempt in 1..=self.max_retries {
            if shutdown.is_cancelled() {
                return Err(FundingError::Cancelled);
            }

            match self.fetch_once().await {
                Ok(entries) => {
                    debug!(markets = entries.len(), "Fetched funding rates");
                    return Ok(rates_from_entries(entries));
                }
                Err(e) => {
                    warn!(url = %self.url, attempt, error = %e, "Funding fetch failed");
                    if attempt < self.max_retries {
                        tokio::select! {
                            () = tokio::time::sleep(Duration::from_millis(delay_ms)) => {}
                            () = shutdown.cancelled() => return Err(FundingError::Cancelled),
                        }
                        delay_ms = (delay_ms * 2).min(RETRY_MAX_MS);
                    }
                }
            }
        }

        Err(FundingError::RetriesExhausted {
            attempts: self.max_retries,
        })
    }

    async fn fetch_once(&self) -> FundingResult<Vec<PremiumIndexEntry>> {
        let response = self.http.get(&self.url).send().await?;
        let entries = response.error_for_status()?.json().await?;
        Ok(entries)
    }
}

/// Parse rate strings into decimals; unparsable entries are skipped.
fn rates_from_entries(entries: Vec<PremiumIndexEntry>) -> HashMap<String, Decimal> {
    let mut rates = HashMap::with_capacity(entries.len());
    for entry in entries {
        match entry.last_funding_rate.parse::<Decimal>() {
            Ok(rate) => {
                rates.insert(entry.symbol, rate);
            }
            Err(e) => {
                warn!(
                    symbol = %entry.symbol,
                    rate = %entry.last_funding_rate,
                    error = %e,
                    "Skipping unparsable funding rate"
                );
            }
        }
    }
    rates
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_entry_deserialization() {
        let raw = r#"[{"symbol":"BTCUSDT","markPrice":"40000.0","lastFundingRate":"0.00010000","nextFundingTime":1700000000000}]"#;
        let entries: Vec<PremiumIndexEntry> = serde_json::from_str(raw).unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].symbol, "BTCUSDT");
        assert_eq!(entries[0].last_funding_rate, "0.00010000");
    }

    #[test]
    fn test_rates_from_entries() {
        let entries = vec![
            PremiumIndexEntry {
                symbol: "BTCUSDT".to_string(),
                last_funding_rate: "0.0001".to_string(),
            },
            PremiumIndexEntry {
                symbol: "ETHUSDT".to_string(),
                last_funding_rate: "-0.0002".to_string(),
            },
        ];

        let rates = rates_from_entries(entries);
        assert_eq!(rates["BTCUSDT"], dec!(0.0001));
        assert_eq!(rates["ETHUSDT"], dec!(-0.0002));
    }

    #[tokio::test]
    async fn test_cancelled_fetch_returns_without_attempting() {
        let client =
            FundingClient::new("http://127.0.0.1:9/premiumIndex".to_string(), 3).unwrap();
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        let err = client.fetch_rates(&shutdown).await.unwrap_err();
        assert!(matches!(err, FundingError::Cancelled));
    }

    #[test]
    fn test_unparsable_rate_skipped() {
        let entries = vec![
            PremiumIndexEntry {
                symbol: "BTCUSDT".to_string(),
                last_funding_rate: "garbage".to_string(),
            },
            PremiumIndexEntry {
                symbol: "ETHUSDT".to_string(),
                last_funding_rate: "0.0003".to_string(),
            },
        ];

        let rates = rates_from_entries(entries);
        assert_eq!(rates.len(), 1);
        assert!(rates.contains_key("ETHUSDT"));
    }
}
