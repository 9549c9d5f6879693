//! Core domain types for the liqflow market data aggregator.
//!
//! This crate provides the fundamental types used throughout the pipeline:
//! - `Symbol`, `SymbolRegistry`: normalized instrument identifiers and the
//!   fixed tracked set
//! - `FeedCategory`, `Direction`: event classification enums
//! - `WindowTotals`: the per-window accumulator bucket

pub mod error;
pub mod symbol;
pub mod types;

pub use error::{CoreError, CoreResult};
pub use symbol::{Symbol, SymbolRegistry};
pub use types::{Direction, FeedCategory, WindowTotals};
