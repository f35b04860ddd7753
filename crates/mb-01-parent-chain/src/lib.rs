//! # Parent Chain Client (Subsystem 1)
//!
//! Polls the proof-of-work parent chain for new blocks and hands them to
//! the finalization orchestrator.
//!
//! ## Guarantees
//!
//! - An RPC failure is never reported as "no new block". `poll_for_new_block`
//!   returns `Ok(None)` only when the tip genuinely has not moved.
//! - Transient failures are retried with exponential backoff capped below
//!   the poll interval.
//! - Malformed responses become [`ParentChainError::MalformedResponse`]. The
//!   client never panics on remote input.
//! - When the tip jumps several heights, every intermediate block is yielded
//!   in order.
//! - A changed hash at an already-seen height is measured and reported as a
//!   [`ParentChainEvent::Reorg`].
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────┐   getinfo / getblock   ┌────────────────────┐
//! │ ParentChainPoller  │ ─────────────────────▶ │ ParentChainClient  │
//! │  retry + window    │                        │ (JSON-RPC / mock)  │
//! └─────────┬──────────┘                        └────────────────────┘
//!           │ ParentChainEvent (bounded mpsc)
//!           ▼
//!     orchestrator
//! ```

#![warn(missing_docs)]
#![allow(missing_docs)]

pub mod adapters;
pub mod config;
pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use adapters::{JsonRpcParentChainClient, MockParentChainClient};
pub use config::{ParentChainConfig, RetryPolicy};
pub use domain::{ParentChainEvent, RecentBlocks};
pub use error::{ParentChainError, ParentChainResult};
pub use ports::ParentChainClient;
pub use service::ParentChainPoller;
