//! Error types for downstream submission.

use thiserror::Error;

/// Failure talking to a downstream sink.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SubmissionError {
    /// Connection or HTTP level failure.
    #[error("Sink transport error: {0}")]
    Transport(String),

    /// The call did not complete within the sink timeout.
    #[error("Sink call timed out after {0}ms")]
    Timeout(u64),

    /// The sink answered with a JSON-RPC error object.
    #[error("Sink RPC error {code}: {message}")]
    Rpc {
        /// JSON-RPC error code
        code: i64,
        /// Error message
        message: String,
    },

    /// The sink reply was missing fields or had the wrong shape.
    #[error("Malformed sink response: {0}")]
    MalformedResponse(String),

    /// The payload could not be encoded.
    #[error("Encoding failed: {0}")]
    Encoding(String),

    /// No blob exists at the requested height and namespace.
    #[error("Blob not found at height {0}")]
    BlobNotFound(u64),
}

impl SubmissionError {
    /// Whether retrying the same call may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SubmissionError::Transport(_)
                | SubmissionError::Timeout(_)
                | SubmissionError::Rpc { .. }
                | SubmissionError::BlobNotFound(_)
        )
    }
}

/// Result type for sink operations.
pub type SubmissionResult<T> = Result<T, SubmissionError>;
