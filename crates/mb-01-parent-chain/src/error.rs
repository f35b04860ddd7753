//! Error types for the parent chain client.

use thiserror::Error;

/// Parent chain errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParentChainError {
    /// Connection or HTTP level failure.
    #[error("Parent chain transport error: {0}")]
    Transport(String),

    /// Request did not complete within the configured timeout.
    #[error("Parent chain request timed out after {0}ms")]
    Timeout(u64),

    /// The node answered with a JSON-RPC error object.
    #[error("Parent chain RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// A field was missing or had the wrong shape.
    #[error("Malformed parent chain response: {0}")]
    MalformedResponse(String),

    /// The node does not know the requested height.
    #[error("Parent block not found at height {0}")]
    BlockNotFound(u64),

    /// Every retry attempt failed.
    #[error("Parent chain unavailable after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: String },
}

impl ParentChainError {
    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ParentChainError::Transport(_)
                | ParentChainError::Timeout(_)
                | ParentChainError::Rpc { .. }
                | ParentChainError::BlockNotFound(_)
        )
    }
}

/// Result type for parent chain operations.
pub type ParentChainResult<T> = Result<T, ParentChainError>;
