//! Application configuration.

use crate::error::{AppError, AppResult};
use liqflow_core::Symbol;
use liqflow_ws::ConnectionConfig;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// WebSocket configuration subset, shared by every stream connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsConfig {
    /// Connection attempts per cycle before a cool-down.
    #[serde(default = "default_max_attempts_per_cycle")]
    pub max_attempts_per_cycle: u32,
    /// Base delay for reconnection backoff (ms).
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
    /// Maximum reconnection backoff (ms).
    #[serde(default = "default_backoff_max_ms")]
    pub backoff_max_ms: u64,
    /// Cool-down between exhausted attempt cycles (ms).
    #[serde(default = "default_cycle_cooldown_ms")]
    pub cycle_cooldown_ms: u64,
    /// Keepalive ping interval (ms).
    #[serde(default = "default_ping_interval_ms")]
    pub ping_interval_ms: u64,
    /// Pong timeout (ms).
    #[serde(default = "default_pong_timeout_ms")]
    pub pong_timeout_ms: u64,
    /// Maximum inbound message size (bytes).
    #[serde(default = "default_max_message_bytes")]
    pub max_message_bytes: usize,
}

fn default_max_attempts_per_cycle() -> u32 {
    5
}

fn default_backoff_base_ms() -> u64 {
    5_000
}

fn default_backoff_max_ms() -> u64 {
    60_000
}

fn default_cycle_cooldown_ms() -> u64 {
    5_000
}

fn default_ping_interval_ms() -> u64 {
    20_000
}

fn default_pong_timeout_ms() -> u64 {
    10_000
}

fn default_max_message_bytes() -> usize {
    1 << 20
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            max_attempts_per_cycle: default_max_attempts_per_cycle(),
            backoff_base_ms: default_backoff_base_ms(),
            backoff_max_ms: default_backoff_max_ms(),
            cycle_cooldown_ms: default_cycle_cooldown_ms(),
            ping_interval_ms: default_ping_interval_ms(),
            pong_timeout_ms: default_pong_timeout_ms(),
            max_message_bytes: default_max_message_bytes(),
        }
    }
}

impl WsConfig {
    /// Build a connection config for one stream URL.
    pub fn connection_config(&self, url: String) -> ConnectionConfig {
        ConnectionConfig {
            url,
            max_attempts_per_cycle: self.max_attempts_per_cycle,
            backoff_base_ms: self.backoff_base_ms,
            backoff_max_ms: self.backoff_max_ms,
            cycle_cooldown_ms: self.cycle_cooldown_ms,
            ping_interval_ms: self.ping_interval_ms,
            pong_timeout_ms: self.pong_timeout_ms,
            max_message_bytes: self.max_message_bytes,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Tracked pairs, "BASE/QUOTE" form.
    #[serde(default = "default_pairs")]
    pub pairs: Vec<String>,
    /// Redis connection URL.
    #[serde(default = "default_redis_url")]
    pub redis_url: String,
    /// Exchange-wide forced-liquidation stream URL.
    #[serde(default = "default_liquidation_url")]
    pub liquidation_url: String,
    /// Per-symbol trade stream URL template; `{}` is replaced with the
    /// lowercase stream name.
    #[serde(default = "default_trade_url_template")]
    pub trade_url_template: String,
    /// Premium-index REST endpoint for funding rates.
    #[serde(default = "default_funding_url")]
    pub funding_url: String,
    /// Aggregation window length (seconds).
    #[serde(default = "default_aggregation_interval_secs")]
    pub aggregation_interval_secs: u64,
    /// Minimum trade notional (USD) to count as large.
    #[serde(default = "default_large_trade_threshold_usd")]
    pub large_trade_threshold_usd: Decimal,
    /// Accept trades exactly at the threshold. Default: false.
    #[serde(default)]
    pub large_trade_threshold_inclusive: bool,
    /// Funding poll interval (seconds).
    #[serde(default = "default_funding_poll_interval_secs")]
    pub funding_poll_interval_secs: u64,
    /// Funding fetch attempts per cycle.
    #[serde(default = "default_funding_max_retries")]
    pub funding_max_retries: u32,
    /// WebSocket configuration.
    #[serde(default)]
    pub websocket: WsConfig,
}

fn default_pairs() -> Vec<String> {
    [
        "BTC/USDT", "ETH/USDT", "XRP/USDT", "SOL/USDT", "LINK/USDT",
        "ADA/USDT", "TRX/USDT", "BNB/USDT", "SUI/USDT", "HBAR/USDT",
        "LTC/USDT", "SUSHI/USDT", "UNI/USDT", "AVAX/USDT", "ALGO/USDT",
        "ETC/USDT", "DOT/USDT", "FIL/USDT", "ARB/USDT", "BCH/USDT",
        "WLD/USDT", "CRV/USDT", "NEAR/USDT", "XLM/USDT", "SAND/USDT",
        "AAVE/USDT", "RENDER/USDT", "APT/USDT", "FTM/USDT", "OP/USDT",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_redis_url() -> String {
    std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string())
}

fn default_liquidation_url() -> String {
    "wss://fstream.binance.com/ws/!forceOrder@arr".to_string()
}

fn default_trade_url_template() -> String {
    "wss://stream.binance.com:9443/ws/{}@aggTrade".to_string()
}

fn default_funding_url() -> String {
    "https://fapi.binance.com/fapi/v1/premiumIndex".to_string()
}

fn default_aggregation_interval_secs() -> u64 {
    60
}

fn default_large_trade_threshold_usd() -> Decimal {
    Decimal::from(10_000)
}

fn default_funding_poll_interval_secs() -> u64 {
    3_600
}

fn default_funding_max_retries() -> u32 {
    3
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            pairs: default_pairs(),
            redis_url: default_redis_url(),
            liquidation_url: default_liquidation_url(),
            trade_url_template: default_trade_url_template(),
            funding_url: default_funding_url(),
            aggregation_interval_secs: default_aggregation_interval_secs(),
            large_trade_threshold_usd: default_large_trade_threshold_usd(),
            large_trade_threshold_inclusive: false,
            funding_poll_interval_secs: default_funding_poll_interval_secs(),
            funding_max_retries: default_funding_max_retries(),
            websocket: WsConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load from a specific file, falling back to defaults when the file
    /// does not exist.
    pub fn load(path: &str) -> AppResult<Self> {
        if Path::new(path).exists() {
            Self::from_file(path)
        } else {
            tracing::warn!(path = %path, "Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load from a specific file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;

        toml::from_str(&content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }

    /// Trade stream URL for one symbol.
    pub fn trade_stream_url(&self, symbol: &Symbol) -> String {
        self.trade_url_template.replace("{}", &symbol.stream_name())
    }

    pub fn aggregation_interval(&self) -> Duration {
        Duration::from_secs(self.aggregation_interval_secs)
    }

    pub fn funding_poll_interval(&self) -> Duration {
        Duration::from_secs(self.funding_poll_interval_secs)
    }
}
