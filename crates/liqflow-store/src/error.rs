//! Store error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Store connection failed: {0}")]
    Connect(String),

    #[error("Write failed: {0}")]
    Write(String),
}

pub type StoreResult<T> = Result<T, StoreError>;
