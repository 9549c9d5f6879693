//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Core error: {0}")]
    Core(#[from] liqflow_core::CoreError),

    #[error("Store error: {0}")]
    Store(#[from] liqflow_store::StoreError),

    #[error("Funding error: {0}")]
    Funding(#[from] liqflow_funding::FundingError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
