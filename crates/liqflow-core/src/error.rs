//! Core error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid pair: {0}")]
    InvalidPair(String),

    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
