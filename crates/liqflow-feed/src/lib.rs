//! Feed ingestion and windowed aggregation.
//!
//! Two ingestion paths feed one aggregation store: the exchange-wide
//! forced-liquidation stream and one aggregated-trade stream per tracked
//! symbol. A flush scheduler drains every bucket on wall-clock-aligned
//! interval boundaries and publishes the totals.

pub mod error;
pub mod flush;
pub mod liquidation;
pub mod parser;
pub mod store;
pub mod trades;

pub use error::{FeedError, FeedResult};
pub use flush::{until_next_boundary, FlushScheduler};
pub use liquidation::LiquidationConsumer;
pub use parser::{parse_liquidation, parse_trade, LiquidationEvent, TradeEvent};
pub use store::{AggregationStore, BucketKey};
pub use trades::{TradeConsumer, TradeThreshold};
