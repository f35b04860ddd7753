use std::collections::BTreeMap;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use shared_types::{StoreError, Timestamp};

/// Timestamp and difficulty observed at a parent height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingEntry {
    /// Parent block timestamp.
    pub timestamp: Timestamp,
    /// Primary difficulty reported by the block.
    pub difficulty: u64,
}

/// Storage for observed parent timings.
pub trait TimingStore: Send + Sync {
    /// Entry recorded at `height`.
    fn get(&self, height: u64) -> Result<Option<TimingEntry>, StoreError>;

    /// Record or overwrite the entry at `height`.
    fn put(&self, height: u64, entry: TimingEntry) -> Result<(), StoreError>;

    /// Drop every entry strictly below `height`, returning how many went.
    fn prune_below(&self, height: u64) -> Result<usize, StoreError>;

    /// Number of stored heights.
    fn len(&self) -> usize;

    /// `true` when nothing is stored.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Ordered in-memory timing store.
#[derive(Debug, Default)]
pub struct InMemoryTimingStore {
    entries: RwLock<BTreeMap<u64, TimingEntry>>,
}

impl InMemoryTimingStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl TimingStore for InMemoryTimingStore {
    fn get(&self, height: u64) -> Result<Option<TimingEntry>, StoreError> {
        Ok(self.entries.read().get(&height).copied())
    }

    fn put(&self, height: u64, entry: TimingEntry) -> Result<(), StoreError> {
        self.entries.write().insert(height, entry);
        Ok(())
    }

    fn prune_below(&self, height: u64) -> Result<usize, StoreError> {
        let mut entries = self.entries.write();
        let kept = entries.split_off(&height);
        let dropped = entries.len();
        *entries = kept;
        Ok(dropped)
    }

    fn len(&self) -> usize {
        self.entries.read().len()
    }
}
