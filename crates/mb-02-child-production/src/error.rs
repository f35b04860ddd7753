//! Error types for child block production

use thiserror::Error;

/// Child block production errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProductionError {
    /// Transaction pool could not be read or updated
    #[error("Transaction pool unavailable: {0}")]
    PoolUnavailable(String),

    /// The orchestrator stopped receiving blocks
    #[error("Child block channel closed")]
    ChannelClosed,
}

/// Result type for child block production
pub type ProductionResult<T> = std::result::Result<T, ProductionError>;
