//! # Nullifier Registry (Subsystem 5)
//!
//! Guarantees each cross-chain claim identifier is consumed by at most one
//! child block transaction.
//!
//! ## Claim State Machine
//!
//! ```text
//!                 record_claim
//!   (absent) ───────────────────▶ Spent ──confirm──▶ Spent + confirmed (terminal)
//!      ▲                            │
//!      │ record_claim               │ record_claim after expiry_timeout
//!      │                            ▼
//!      └─────────────────────── Expired   (the call returns PendingTimeout)
//! ```
//!
//! - A second claim on a live `Spent` nullifier is a `DoubleSpend`.
//! - Check-then-insert runs under a lock scoped to the nullifier id, so
//!   unrelated claims never contend.
//! - Reads (`is_spent`, `get`, `len`) go straight to the store.
//!
//! ## Storage
//!
//! | Adapter | Durability |
//! |---------|------------|
//! | [`InMemoryNullifierStore`] | none, tests and dev |
//! | [`FileNullifierStore`] | JSON snapshot, temp file + fsync + rename |
//! | `RocksDbNullifierStore` | feature `rocksdb`, synced writes |

#![warn(missing_docs)]

pub mod adapters;
pub mod config;
pub mod error;
pub mod ports;
pub mod service;

#[cfg(feature = "rocksdb")]
pub use adapters::RocksDbNullifierStore;
pub use adapters::{FileNullifierStore, InMemoryNullifierStore};
pub use config::NullifierConfig;
pub use error::{ClaimError, ClaimResult};
pub use ports::NullifierStore;
pub use service::NullifierRegistry;
