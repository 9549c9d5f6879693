//! Published record types.

use chrono::{DateTime, Utc};
use liqflow_core::WindowTotals;
use rust_decimal::Decimal;

/// UTC timestamp with second precision, as stored in published records.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// One flushed window for one symbol/category, published as a whole-record
/// overwrite. All-zero records are published too, so the consumer can
/// distinguish "no activity" from "no data yet".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateRecord {
    /// Flush time, UTC, second precision.
    pub timestamp: String,
    pub long_count: u64,
    pub short_count: u64,
    pub long_usd_size: Decimal,
    pub short_usd_size: Decimal,
}

impl AggregateRecord {
    /// Build from drained window totals, tagged with the flush time.
    pub fn from_totals(flushed_at: DateTime<Utc>, totals: &WindowTotals) -> Self {
        Self {
            timestamp: format_timestamp(flushed_at),
            long_count: totals.long_count,
            short_count: totals.short_count,
            long_usd_size: totals.long_usd_size,
            short_usd_size: totals.short_usd_size,
        }
    }

    /// Hash field pairs for the store write.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("timestamp", self.timestamp.clone()),
            ("long_count", self.long_count.to_string()),
            ("short_count", self.short_count.to_string()),
            ("long_usd_size", self.long_usd_size.to_string()),
            ("short_usd_size", self.short_usd_size.to_string()),
        ]
    }
}

/// Latest funding rate for one symbol. Overwritten wholesale on each
/// successful poll; no accumulation semantics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FundingRecord {
    pub funding_rate: Decimal,
    /// Observation time, UTC, second precision.
    pub timestamp: String,
}

impl FundingRecord {
    pub fn new(rate: Decimal, observed_at: DateTime<Utc>) -> Self {
        Self {
            funding_rate: rate,
            timestamp: format_timestamp(observed_at),
        }
    }

    /// Hash field pairs for the store write.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("funding_rate", self.funding_rate.to_string()),
            ("timestamp", self.timestamp.clone()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn flush_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap()
    }

    #[test]
    fn test_timestamp_format_second_precision() {
        assert_eq!(format_timestamp(flush_time()), "2024-05-01 12:30:00");
    }

    #[test]
    fn test_record_from_totals() {
        let mut totals = WindowTotals::default();
        totals.record(liqflow_core::Direction::Long, dec!(5000));

        let record = AggregateRecord::from_totals(flush_time(), &totals);
        assert_eq!(record.long_count, 1);
        assert_eq!(record.long_usd_size, dec!(5000));
        assert_eq!(record.short_count, 0);
        assert_eq!(record.timestamp, "2024-05-01 12:30:00");
    }

    #[test]
    fn test_record_fields_layout() {
        let record = AggregateRecord::from_totals(flush_time(), &WindowTotals::default());
        let fields = record.fields();
        assert_eq!(fields.len(), 5);
        assert_eq!(fields[0].0, "timestamp");
        assert_eq!(fields[1], ("long_count", "0".to_string()));
    }

    #[test]
    fn test_funding_record_fields() {
        let record = FundingRecord::new(dec!(-0.0001), flush_time());
        let fields = record.fields();
        assert_eq!(fields[0], ("funding_rate", "-0.0001".to_string()));
        assert_eq!(fields[1], ("timestamp", "2024-05-01 12:30:00".to_string()));
    }
}
