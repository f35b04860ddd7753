use std::collections::HashMap;

use parking_lot::RwLock;
use shared_types::{StoreError, ValidatorId, ValidatorStake};

/// Storage for validator stakes subject to slashing.
pub trait StakeStore: Send + Sync {
    /// Stake of `id`, if registered.
    fn get(&self, id: &ValidatorId) -> Result<Option<ValidatorStake>, StoreError>;

    /// Insert or replace a stake.
    fn put(&self, stake: ValidatorStake) -> Result<(), StoreError>;

    /// Remove `id`, returning its last stake.
    fn remove(&self, id: &ValidatorId) -> Result<Option<ValidatorStake>, StoreError>;

    /// Every registered stake.
    fn all(&self) -> Result<Vec<ValidatorStake>, StoreError>;
}

/// In-memory stake table.
#[derive(Debug, Default)]
pub struct InMemoryStakeStore {
    stakes: RwLock<HashMap<ValidatorId, ValidatorStake>>,
}

impl InMemoryStakeStore {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Table seeded with `stakes`.
    pub fn with_stakes(stakes: impl IntoIterator<Item = ValidatorStake>) -> Self {
        let map = stakes
            .into_iter()
            .map(|s| (s.validator_id.clone(), s))
            .collect();
        Self {
            stakes: RwLock::new(map),
        }
    }
}

impl StakeStore for InMemoryStakeStore {
    fn get(&self, id: &ValidatorId) -> Result<Option<ValidatorStake>, StoreError> {
        Ok(self.stakes.read().get(id).cloned())
    }

    fn put(&self, stake: ValidatorStake) -> Result<(), StoreError> {
        self.stakes
            .write()
            .insert(stake.validator_id.clone(), stake);
        Ok(())
    }

    fn remove(&self, id: &ValidatorId) -> Result<Option<ValidatorStake>, StoreError> {
        Ok(self.stakes.write().remove(id))
    }

    fn all(&self) -> Result<Vec<ValidatorStake>, StoreError> {
        let mut all: Vec<_> = self.stakes.read().values().cloned().collect();
        all.sort_by(|a, b| a.validator_id.cmp(&b.validator_id));
        Ok(all)
    }
}
