//! Wire message parsing and classification.
//!
//! Both feeds carry prices and quantities as decimal strings; they are
//! parsed into `Decimal` so window sums stay exact. A malformed message is
//! a per-message error, never a transport failure.

use crate::error::{FeedError, FeedResult};
use liqflow_core::Direction;
use rust_decimal::Decimal;
use serde::Deserialize;

/// Forced-liquidation stream frame. Only the order payload matters.
#[derive(Debug, Deserialize)]
pub struct ForceOrderMessage {
    #[serde(rename = "o")]
    pub order: ForceOrder,
}

/// Order payload of a forced liquidation.
#[derive(Debug, Deserialize)]
pub struct ForceOrder {
    /// Exchange-native symbol, e.g. "BTCUSDT".
    #[serde(rename = "s")]
    pub symbol: String,
    /// Order side, "BUY" or "SELL".
    #[serde(rename = "S")]
    pub side: String,
    #[serde(rename = "p")]
    pub price: String,
    #[serde(rename = "q")]
    pub quantity: String,
}

/// Aggregated-trade stream frame.
#[derive(Debug, Deserialize)]
pub struct AggTradeMessage {
    #[serde(rename = "p")]
    pub price: String,
    #[serde(rename = "q")]
    pub quantity: String,
    /// True when the buyer is the maker, i.e. the aggressor sold.
    #[serde(rename = "m")]
    pub buyer_is_maker: bool,
}

/// One classified liquidation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiquidationEvent {
    /// Exchange-native symbol as carried on the wire.
    pub symbol: String,
    pub direction: Direction,
    pub usd_size: Decimal,
}

/// One classified trade (threshold not yet applied).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradeEvent {
    pub direction: Direction,
    pub usd_size: Decimal,
}

fn parse_decimal(field: &'static str, value: &str) -> FeedResult<Decimal> {
    value
        .parse::<Decimal>()
        .map_err(|e| FeedError::Parse(format!("invalid {field} '{value}': {e}")))
}

/// Parse and classify one forced-liquidation frame.
///
/// A buy-side liquidation closes out a short position and counts toward
/// the long totals; sell-side counts toward short. Any other side string
/// is a parse error.
pub fn parse_liquidation(raw: &str) -> FeedResult<LiquidationEvent> {
    let msg: ForceOrderMessage = serde_json::from_str(raw)?;
    let order = msg.order;

    let direction = match order.side.as_str() {
        "BUY" => Direction::Long,
        "SELL" => Direction::Short,
        other => return Err(FeedError::Parse(format!("unknown order side '{other}'"))),
    };

    let price = parse_decimal("price", &order.price)?;
    let quantity = parse_decimal("quantity", &order.quantity)?;

    Ok(LiquidationEvent {
        symbol: order.symbol,
        direction,
        usd_size: price * quantity,
    })
}

/// Parse and classify one aggregated-trade frame.
///
/// When the buyer is the maker the aggressor sold into the book, so the
/// trade counts as short pressure; otherwise long.
pub fn parse_trade(raw: &str) -> FeedResult<TradeEvent> {
    let msg: AggTradeMessage = serde_json::from_str(raw)?;

    let price = parse_decimal("price", &msg.price)?;
    let quantity = parse_decimal("quantity", &msg.quantity)?;

    Ok(TradeEvent {
        direction: if msg.buyer_is_maker {
            Direction::Short
        } else {
            Direction::Long
        },
        usd_size: price * quantity,
    })
}
