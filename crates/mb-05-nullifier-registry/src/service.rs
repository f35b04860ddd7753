//! The nullifier registry service.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use shared_types::{
    short_hex, Hash, Nullifier, NullifierStatus, SystemTimeSource, TimeSource,
};
use tracing::{debug, info, warn};

use crate::config::NullifierConfig;
use crate::error::{ClaimError, ClaimResult};
use crate::ports::NullifierStore;

/// Records one-time claims and rejects replays.
///
/// Cheap to share behind an `Arc`; every method takes `&self`.
pub struct NullifierRegistry {
    store: Arc<dyn NullifierStore>,
    config: NullifierConfig,
    clock: Arc<dyn TimeSource>,
    locks: DashMap<Hash, Arc<Mutex<()>>>,
}

impl NullifierRegistry {
    /// Registry over `store` using the wall clock.
    pub fn new(store: Arc<dyn NullifierStore>, config: NullifierConfig) -> Self {
        Self {
            store,
            config,
            clock: Arc::new(SystemTimeSource),
            locks: DashMap::new(),
        }
    }

    /// Replace the clock used for `recorded_at` and expiry.
    pub fn with_clock(mut self, clock: Arc<dyn TimeSource>) -> Self {
        self.clock = clock;
        self
    }

    /// Consume `nullifier_id` for the transaction `source_tx_hash`.
    pub fn record_claim(
        &self,
        nullifier_id: Hash,
        source_tx_hash: Hash,
        recipient: &str,
        block_height: u64,
    ) -> ClaimResult<()> {
        self.with_id_lock(nullifier_id, || {
            let now = self.clock.now();

            if let Some(mut existing) = self.store.get(&nullifier_id)? {
                if existing.status == NullifierStatus::Spent {
                    let age = now.saturating_sub(existing.recorded_at);
                    if existing.confirmed_at.is_some() || age <= self.config.expiry_timeout_secs {
                        warn!(
                            "[mb-05] 🚫 Double spend of {} (first at height {})",
                            short_hex(&nullifier_id),
                            existing.block_height_recorded
                        );
                        return Err(ClaimError::DoubleSpend {
                            id: nullifier_id,
                            height: existing.block_height_recorded,
                        });
                    }

                    existing.status = NullifierStatus::Expired;
                    self.store.put(existing)?;
                    warn!(
                        "[mb-05] ⏳ Nullifier {} unconfirmed after {}s, marked expired",
                        short_hex(&nullifier_id),
                        age
                    );
                    return Err(ClaimError::PendingTimeout { id: nullifier_id });
                }
                debug!(
                    "[mb-05] Reclaiming expired nullifier {}",
                    short_hex(&nullifier_id)
                );
            }

            self.store.put(Nullifier {
                id: nullifier_id,
                block_height_recorded: block_height,
                recorded_at: now,
                source_tx_hash,
                recipient: recipient.to_string(),
                status: NullifierStatus::Spent,
                confirmed_at: None,
            })?;
            debug!(
                "[mb-05] Recorded {} at child height {}",
                short_hex(&nullifier_id),
                block_height
            );
            Ok(())
        })
    }

    /// Mark a spent nullifier as settled so it never expires.
    ///
    /// Returns `false` when there is no live spent record to confirm.
    pub fn confirm(&self, nullifier_id: &Hash) -> ClaimResult<bool> {
        self.with_id_lock(*nullifier_id, || {
            let Some(mut record) = self.store.get(nullifier_id)? else {
                return Ok(false);
            };
            if record.status != NullifierStatus::Spent {
                return Ok(false);
            }
            if record.confirmed_at.is_none() {
                record.confirmed_at = Some(self.clock.now());
                self.store.put(record)?;
            }
            Ok(true)
        })
    }

    /// Confirm every id in `ids`, returning how many were confirmed.
    pub fn confirm_all(&self, ids: &[Hash]) -> ClaimResult<usize> {
        let mut confirmed = 0;
        for id in ids {
            if self.confirm(id)? {
                confirmed += 1;
            }
        }
        if confirmed > 0 {
            info!("[mb-05] ✅ Confirmed {} nullifiers", confirmed);
        }
        Ok(confirmed)
    }

    /// `true` iff `nullifier_id` has a `Spent` record.
    pub fn is_spent(&self, nullifier_id: &Hash) -> ClaimResult<bool> {
        Ok(self
            .store
            .get(nullifier_id)?
            .is_some_and(|n| n.status == NullifierStatus::Spent))
    }

    /// Stored record for `nullifier_id`.
    pub fn get(&self, nullifier_id: &Hash) -> ClaimResult<Option<Nullifier>> {
        Ok(self.store.get(nullifier_id)?)
    }

    /// Number of recorded nullifiers.
    pub fn len(&self) -> ClaimResult<usize> {
        Ok(self.store.len()?)
    }

    /// `true` when nothing has been recorded.
    pub fn is_empty(&self) -> ClaimResult<bool> {
        Ok(self.store.is_empty()?)
    }

    fn with_id_lock<T>(&self, id: Hash, f: impl FnOnce() -> ClaimResult<T>) -> ClaimResult<T> {
        let lock = self.locks.entry(id).or_default().clone();
        let result = {
            let _guard = lock.lock();
            f()
        };
        drop(lock);
        // Only the map holds it now, so no waiter can be parked on this mutex.
        self.locks.remove_if(&id, |_, l| Arc::strong_count(l) == 1);
        result
    }
}
