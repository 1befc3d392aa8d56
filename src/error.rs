//! Crate error types. Every failure is reported to the immediate caller; nothing retries.

use crate::records::RecordKey;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or out-of-order input, rejected before feature computation.
    #[error("invalid record {key}: {reason}")]
    InvalidRecord { key: RecordKey, reason: String },

    #[error("anomaly model is not fitted")]
    NotFitted,

    #[error("insufficient data: need at least {required} records, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    pub fn invalid_record(key: &RecordKey, reason: impl Into<String>) -> Self {
        Error::InvalidRecord {
            key: key.clone(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
