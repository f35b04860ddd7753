//! Error types for proof-of-work verification

use thiserror::Error;

/// Why a parent block failed verification
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PowError {
    /// Primary hash not below the primary target
    #[error("Primary hash {value:#x} does not meet target {target:#x}")]
    PrimaryTargetMissed {
        /// Leading value of the hash
        value: u64,
        /// Target it was compared against
        target: u64,
    },

    /// Auxiliary hash not below the auxiliary target
    #[error("Auxiliary hash {value:#x} does not meet target {target:#x}")]
    AuxiliaryTargetMissed {
        /// Leading value of the hash
        value: u64,
        /// Target it was compared against
        target: u64,
    },

    /// Auxiliary target present but header lacks its inputs
    #[error("Auxiliary target set but header lacks {0}")]
    MissingAuxiliaryData(&'static str),

    /// The block reports a target easier than policy allows
    #[error("Reported target {reported:#x} is easier than ceiling {ceiling:#x}")]
    TargetTooEasy {
        /// Target claimed by the block
        reported: u64,
        /// Configured ceiling
        ceiling: u64,
    },

    /// Bad configuration
    #[error("Invalid PoW configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for verification
pub type PowResult<T> = std::result::Result<T, PowError>;
