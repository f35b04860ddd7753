//! Reorg depth classification and slashing.

mod config;
mod guard;
mod store;

pub use config::ReorgConfig;
pub use guard::{ReorgGuard, ReorgOutcome, SlashRecord};
pub use store::{InMemoryStakeStore, StakeStore};
