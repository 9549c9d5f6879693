//! Funding poller error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FundingError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Funding fetch failed after {attempts} attempts")]
    RetriesExhausted { attempts: u32 },

    #[error("Funding fetch cancelled by shutdown")]
    Cancelled,
}

pub type FundingResult<T> = Result<T, FundingError>;
