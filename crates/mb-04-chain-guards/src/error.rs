//! Error types for the chain guards

use shared_types::StoreError;
use thiserror::Error;

/// Guard failures
#[derive(Debug, Clone, Error)]
pub enum GuardError {
    /// Backing store failed
    #[error("Guard store error: {0}")]
    Store(#[from] StoreError),

    /// Bad configuration
    #[error("Invalid guard configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for guard operations
pub type GuardResult<T> = std::result::Result<T, GuardError>;
