use dashmap::DashMap;
use shared_types::{Hash, Nullifier, StoreError};

use crate::ports::NullifierStore;

/// Sharded in-memory store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct InMemoryNullifierStore {
    records: DashMap<Hash, Nullifier>,
}

impl InMemoryNullifierStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl NullifierStore for InMemoryNullifierStore {
    fn get(&self, id: &Hash) -> Result<Option<Nullifier>, StoreError> {
        Ok(self.records.get(id).map(|r| r.value().clone()))
    }

    fn put(&self, nullifier: Nullifier) -> Result<(), StoreError> {
        self.records.insert(nullifier.id, nullifier);
        Ok(())
    }

    fn len(&self) -> Result<usize, StoreError> {
        Ok(self.records.len())
    }

    fn all(&self) -> Result<Vec<Nullifier>, StoreError> {
        Ok(self.records.iter().map(|r| r.value().clone()).collect())
    }
}
