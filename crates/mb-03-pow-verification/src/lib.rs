//! # Difficulty / PoW Verifier (Subsystem 3)
//!
//! Decides whether a parent block carries enough work to finalize against.
//!
//! ## Rules
//!
//! | Check | Input | Passes iff |
//! |-------|-------|------------|
//! | Primary | `HeaderHasher(serialize(header, nonce))` | `leading(hash) < primary_difficulty` |
//! | Auxiliary | `AuxiliaryHasher(aux_block_hash, external_commitment)` | `leading(hash) < auxiliary_difficulty` |
//!
//! - `leading` reads the first 4 to 8 bytes as an unsigned big-endian integer.
//! - Equality with a target is a failure.
//! - When the block carries an auxiliary target both checks must pass.
//!
//! Both hash functions are traits. The bundled [`hashers`] are stand-ins a
//! deployment replaces with the real parent chain and commitment functions.

#![warn(missing_docs)]

pub mod config;
pub mod domain;
pub mod error;
pub mod hashers;
pub mod verifier;

pub use config::{PowConfig, PrimaryHashAlgorithm};
pub use domain::{leading_value, meets_target, serialize_header};
pub use error::{PowError, PowResult};
pub use hashers::{AuxiliaryHasher, HeaderHasher, ScratchpadHasher, Sha256dHasher, SquareMixHasher};
pub use verifier::{DifficultyVerifier, PowReport};
