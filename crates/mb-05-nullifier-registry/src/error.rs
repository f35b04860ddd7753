//! Error types for the nullifier registry

use shared_types::{short_hex, Hash, StoreError};
use thiserror::Error;

/// Why a claim was not recorded
#[derive(Debug, Clone, Error)]
pub enum ClaimError {
    /// The nullifier is already spent and still live
    #[error("Nullifier {} already spent at child height {height}", short_hex(.id))]
    DoubleSpend {
        /// Nullifier id
        id: Hash,
        /// Height at which it was first recorded
        height: u64,
    },

    /// The previous claim timed out unconfirmed and was marked expired
    #[error("Nullifier {} timed out pending confirmation; retry as a fresh claim", short_hex(.id))]
    PendingTimeout {
        /// Nullifier id
        id: Hash,
    },

    /// Backing store failed
    #[error("Nullifier store error: {0}")]
    Store(#[from] StoreError),
}

impl ClaimError {
    /// `true` for outcomes that reject the claim itself rather than the store.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            ClaimError::DoubleSpend { .. } | ClaimError::PendingTimeout { .. }
        )
    }
}

/// Result type for registry operations
pub type ClaimResult<T> = std::result::Result<T, ClaimError>;
