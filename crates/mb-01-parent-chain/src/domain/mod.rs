//! Domain types for parent chain polling.

mod recent_blocks;

pub use recent_blocks::RecentBlocks;

use shared_types::{ParentBlockRef, ReorgEvent};

/// What a poll observed on the parent chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParentChainEvent {
    /// A block at a height not seen before.
    NewBlock(ParentBlockRef),
    /// Previously seen blocks were replaced.
    Reorg(ReorgEvent),
}

impl ParentChainEvent {
    /// Parent height the event refers to.
    pub fn height(&self) -> u64 {
        match self {
            ParentChainEvent::NewBlock(block) => block.height,
            ParentChainEvent::Reorg(event) => event.proof.fork_height + event.depth,
        }
    }
}
