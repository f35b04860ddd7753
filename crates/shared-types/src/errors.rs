//! # Error Types
//!
//! Errors shared by the storage ports of several subsystems.

use thiserror::Error;

/// Failure of a persistent or in-memory store backing a guard.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Reading or writing the backing medium failed.
    #[error("Store I/O error: {0}")]
    Io(String),

    /// Stored bytes could not be decoded.
    #[error("Store data corruption: {0}")]
    Corruption(String),

    /// Encoding a record for storage failed.
    #[error("Store serialization error: {0}")]
    Serialization(String),
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_io() {
            StoreError::Io(err.to_string())
        } else if err.is_data() || err.is_syntax() || err.is_eof() {
            StoreError::Corruption(err.to_string())
        } else {
            StoreError::Serialization(err.to_string())
        }
    }
}
