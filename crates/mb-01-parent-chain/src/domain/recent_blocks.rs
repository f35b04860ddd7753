//! Sliding window of recently seen parent blocks.

use std::collections::VecDeque;

use shared_types::Hash;

/// Bounded, height-ordered record of `(height, hash)` pairs.
#[derive(Debug, Clone)]
pub struct RecentBlocks {
    entries: VecDeque<(u64, Hash)>,
    capacity: usize,
}

impl RecentBlocks {
    /// Create a window holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.max(1)),
            capacity: capacity.max(1),
        }
    }

    /// Record a block. Heights must be appended in increasing order.
    pub fn record(&mut self, height: u64, hash: Hash) {
        if let Some(&(last, _)) = self.entries.back() {
            if height <= last {
                self.truncate_above(height.saturating_sub(1));
            }
        }
        self.entries.push_back((height, hash));
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// Highest recorded block.
    pub fn tip(&self) -> Option<(u64, Hash)> {
        self.entries.back().copied()
    }

    /// Recorded hash at `height`, if still in the window.
    pub fn hash_at(&self, height: u64) -> Option<Hash> {
        self.entries
            .iter()
            .find(|(h, _)| *h == height)
            .map(|(_, hash)| *hash)
    }

    /// Heights below the tip, newest first.
    pub fn heights_descending(&self) -> Vec<u64> {
        self.entries.iter().rev().skip(1).map(|(h, _)| *h).collect()
    }

    /// Drop every entry above `height`.
    pub fn truncate_above(&mut self, height: u64) {
        while matches!(self.entries.back(), Some(&(h, _)) if h > height) {
            self.entries.pop_back();
        }
    }

    /// Number of recorded entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of entries kept.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
