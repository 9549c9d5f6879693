//! Event classification enums and the window accumulator bucket.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Aggregation category, one bucket family per tracked symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedCategory {
    /// Forced-liquidation events.
    Liquidation,
    /// Trades above the configured USD threshold.
    LargeTrade,
}

impl FeedCategory {
    pub const ALL: [FeedCategory; 2] = [FeedCategory::Liquidation, FeedCategory::LargeTrade];

    /// External key prefix for published records.
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedCategory::Liquidation => "liquidation",
            FeedCategory::LargeTrade => "large_trade",
        }
    }
}

impl fmt::Display for FeedCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Classified direction of a market event.
///
/// A buy-side liquidation unwinds a short position and counts as `Long`;
/// a sell-side liquidation counts as `Short`. For trades the direction is
/// that of the aggressor (taker) side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Long,
    Short,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Long => write!(f, "long"),
            Direction::Short => write!(f, "short"),
        }
    }
}

/// Running totals for one symbol/category bucket within the current window.
///
/// Mutation is addition-only between flushes; the flush scheduler swaps the
/// whole value out for a zeroed one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowTotals {
    pub long_count: u64,
    pub short_count: u64,
    pub long_usd_size: Decimal,
    pub short_usd_size: Decimal,
}

impl WindowTotals {
    /// Add one classified event's contribution.
    pub fn record(&mut self, direction: Direction, usd_size: Decimal) {
        match direction {
            Direction::Long => {
                self.long_count += 1;
                self.long_usd_size += usd_size;
            }
            Direction::Short => {
                self.short_count += 1;
                self.short_usd_size += usd_size;
            }
        }
    }

    pub fn is_zero(&self) -> bool {
        self.long_count == 0
            && self.short_count == 0
            && self.long_usd_size.is_zero()
            && self.short_usd_size.is_zero()
    }
}
