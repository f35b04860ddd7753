//! Pending child blocks and the finalized-height watermark.

use std::collections::HashSet;

use shared_types::{ChildBlock, Hash};

/// Child blocks waiting for the next parent block, in arrival order.
#[derive(Debug, Default)]
pub struct PendingBuffer {
    blocks: Vec<ChildBlock>,
    hashes: HashSet<Hash>,
}

impl PendingBuffer {
    /// Empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `block`. Returns `false` if a block with the same hash is already buffered.
    pub fn push(&mut self, block: ChildBlock) -> bool {
        if !self.hashes.insert(block.hash()) {
            return false;
        }
        self.blocks.push(block);
        true
    }

    /// Whether a block with `hash` is buffered.
    pub fn contains(&self, hash: &Hash) -> bool {
        self.hashes.contains(hash)
    }

    /// Remove and return every buffered block.
    pub fn take_all(&mut self) -> Vec<ChildBlock> {
        self.hashes.clear();
        std::mem::take(&mut self.blocks)
    }

    /// Buffered blocks, oldest first.
    pub fn blocks(&self) -> &[ChildBlock] {
        &self.blocks
    }

    /// Number of buffered blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// `true` when nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// Highest finalized child height.
///
/// Child heights are contiguous and finalized in order, so every block at or
/// below the watermark is final.
#[derive(Debug, Default, Clone, Copy)]
pub struct FinalizedWatermark {
    highest: Option<u64>,
}

impl FinalizedWatermark {
    /// Nothing finalized yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the watermark to `height`. Lower heights leave it unchanged.
    pub fn advance(&mut self, height: u64) {
        self.highest = Some(self.highest.map_or(height, |h| h.max(height)));
    }

    /// Whether a child block at `height` is already final.
    pub fn covers(&self, height: u64) -> bool {
        self.highest.is_some_and(|h| height <= h)
    }

    /// Highest finalized child height.
    pub fn highest(&self) -> Option<u64> {
        self.highest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{ChildBlockStatus, DEFAULT_GAS_LIMIT, ZERO_HASH};

    fn block(height: u64) -> ChildBlock {
        ChildBlock {
            height,
            timestamp: height,
            transactions: vec![],
            previous_hash: ZERO_HASH,
            merkle_root: ZERO_HASH,
            gas_used: 0,
            gas_limit: DEFAULT_GAS_LIMIT,
            status: ChildBlockStatus::Pending,
        }
    }

    #[test]
    fn test_push_rejects_duplicates_and_take_clears() {
        let mut buffer = PendingBuffer::new();
        assert!(buffer.push(block(1)));
        assert!(buffer.push(block(2)));
        assert!(!buffer.push(block(1)));
        assert_eq!(buffer.len(), 2);

        let taken = buffer.take_all();
        assert_eq!(taken.iter().map(|b| b.height).collect::<Vec<_>>(), vec![1, 2]);
        assert!(buffer.is_empty());
        assert!(buffer.push(block(1)));
    }

    #[test]
    fn test_watermark_covers_everything_at_or_below() {
        let mut mark = FinalizedWatermark::new();
        assert!(!mark.covers(0));

        mark.advance(103);
        mark.advance(101);
        assert_eq!(mark.highest(), Some(103));
        assert!(mark.covers(1));
        assert!(mark.covers(103));
        assert!(!mark.covers(104));
    }
}
