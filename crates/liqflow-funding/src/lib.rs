//! Funding-rate polling.
//!
//! Unlike the event feeds, funding is a point-in-time value fetched over
//! REST: each cycle overwrites `funding_rate:{symbol}` wholesale, and a
//! failed cycle leaves the previous record standing until the next one.

pub mod client;
pub mod error;
pub mod poller;

pub use client::{FundingClient, PremiumIndexEntry};
pub use error::{FundingError, FundingResult};
pub use poller::FundingPoller;
