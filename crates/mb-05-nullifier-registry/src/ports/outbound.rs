//! Driven ports

use shared_types::{Hash, Nullifier, StoreError};

/// Persistent nullifier records keyed by id.
///
/// Implementations must make a completed `put` durable before returning.
/// Atomicity across `get` then `put` is the registry's job, not the store's.
pub trait NullifierStore: Send + Sync {
    /// Record for `id`, if any.
    fn get(&self, id: &Hash) -> Result<Option<Nullifier>, StoreError>;

    /// Insert or replace the record for `nullifier.id`.
    fn put(&self, nullifier: Nullifier) -> Result<(), StoreError>;

    /// Number of records.
    fn len(&self) -> Result<usize, StoreError>;

    /// `true` when there are no records.
    fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    /// Every record, in no particular order.
    fn all(&self) -> Result<Vec<Nullifier>, StoreError>;
}
