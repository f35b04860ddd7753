//! # Shared Types Crate
//!
//! Domain entities exchanged between the bridge subsystems.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: every type that crosses a crate boundary is
//!   defined here, so the producer, the guards and the orchestrator agree on
//!   one wire shape.
//! - **Identity excludes lifecycle**: a child block's content hash never covers
//!   its status, so finalizing a block cannot change the hash a proof binds.
//! - **Hex on the wire**: hashes serialize as lowercase hex strings.

pub mod entities;
pub mod errors;
pub mod time;

pub use entities::*;
pub use errors::*;
pub use time::{ManualTimeSource, SystemTimeSource, TimeSource};
