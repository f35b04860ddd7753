use std::collections::BTreeSet;
use std::sync::Arc;

use shared_types::{ReorgDecision, ReorgProof, SystemTimeSource, TimeSource, ValidatorId};
use tracing::{error, info, warn};

use super::config::{ReorgConfig, BASIS_POINTS};
use super::store::StakeStore;
use crate::error::GuardResult;

/// Stake taken from one validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlashRecord {
    /// Slashed validator.
    pub validator_id: ValidatorId,
    /// Amount taken.
    pub amount: u128,
    /// Stake left afterwards.
    pub remaining: u128,
}

/// Result of evaluating one reorg.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReorgOutcome {
    /// Decision class.
    pub decision: ReorgDecision,
    /// Validators slashed, in id order.
    pub slashed: Vec<SlashRecord>,
    /// Validators removed for falling below the stake floor.
    pub removed: Vec<ValidatorId>,
}

impl ReorgOutcome {
    fn without_penalty(decision: ReorgDecision) -> Self {
        Self {
            decision,
            slashed: Vec::new(),
            removed: Vec::new(),
        }
    }
}

/// Bounds how deep a parent chain reorg may go before the bridge stops trusting it.
pub struct ReorgGuard {
    store: Arc<dyn StakeStore>,
    config: ReorgConfig,
    clock: Arc<dyn TimeSource>,
}

impl ReorgGuard {
    /// Guard over `store`.
    pub fn new(store: Arc<dyn StakeStore>, config: ReorgConfig) -> GuardResult<Self> {
        config.validate()?;
        Ok(Self {
            store,
            config,
            clock: Arc::new(SystemTimeSource),
        })
    }

    /// Replace the clock stamped on slashed stakes.
    pub fn with_clock(mut self, clock: Arc<dyn TimeSource>) -> Self {
        self.clock = clock;
        self
    }

    /// Thresholds in use.
    pub fn config(&self) -> &ReorgConfig {
        &self.config
    }

    /// Decision for `depth` without side effects.
    pub fn classify(&self, depth: u64) -> ReorgDecision {
        if depth <= self.config.acceptable_depth {
            ReorgDecision::Accept
        } else if depth <= self.config.max_reorg_depth {
            ReorgDecision::AcceptWithPenalty
        } else {
            ReorgDecision::EmergencyHalt
        }
    }

    /// Classify `depth` and apply slashing when the decision calls for it.
    pub fn evaluate(&self, depth: u64, proof: &ReorgProof) -> GuardResult<ReorgOutcome> {
        let decision = self.classify(depth);
        match decision {
            ReorgDecision::Accept => {
                info!("[mb-04] Reorg of depth {} accepted", depth);
                Ok(ReorgOutcome::without_penalty(decision))
            }
            ReorgDecision::EmergencyHalt => {
                error!(
                    "[mb-04] 🚨 Reorg of depth {} exceeds maximum {} (fork at {})",
                    depth, self.config.max_reorg_depth, proof.fork_height
                );
                Ok(ReorgOutcome::without_penalty(decision))
            }
            ReorgDecision::AcceptWithPenalty => {
                let implicated = self.implicated(proof)?;
                warn!(
                    "[mb-04] ⚠️ Reorg of depth {} accepted with penalty, {} implicated",
                    depth,
                    implicated.len()
                );
                let (slashed, removed) = self.slash(&implicated)?;
                Ok(ReorgOutcome {
                    decision,
                    slashed,
                    removed,
                })
            }
        }
    }

    /// Validators named by the proof, or the whole active set when it names none.
    fn implicated(&self, proof: &ReorgProof) -> GuardResult<Vec<ValidatorId>> {
        if !proof.implicated.is_empty() {
            return Ok(proof.implicated.clone());
        }
        Ok(self
            .store
            .all()?
            .into_iter()
            .map(|stake| stake.validator_id)
            .collect())
    }

    fn slash(&self, implicated: &[ValidatorId]) -> GuardResult<(Vec<SlashRecord>, Vec<ValidatorId>)> {
        let bps = u128::from(self.config.slash_basis_points);
        let now = self.clock.now();
        let mut slashed = Vec::new();
        let mut removed = Vec::new();

        // A validator named twice is slashed once.
        let unique: BTreeSet<&ValidatorId> = implicated.iter().collect();

        for id in unique {
            let Some(mut stake) = self.store.get(id)? else {
                warn!("[mb-04] Implicated validator {} has no stake, skipping", id);
                continue;
            };

            let amount = stake.staked * bps / BASIS_POINTS;
            stake.staked -= amount;
            stake.penalties += amount;
            stake.last_activity = now;

            slashed.push(SlashRecord {
                validator_id: id.clone(),
                amount,
                remaining: stake.staked,
            });

            if stake.staked < self.config.minimum_stake {
                warn!(
                    "[mb-04] Validator {} fell to {} below floor {}, removing",
                    id, stake.staked, self.config.minimum_stake
                );
                self.store.remove(id)?;
                removed.push(id.clone());
            } else {
                self.store.put(stake)?;
            }
        }

        Ok((slashed, removed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reorg::InMemoryStakeStore;
    use shared_types::{ManualTimeSource, ValidatorStake};

    fn stake(id: &str, amount: u128) -> ValidatorStake {
        ValidatorStake {
            validator_id: id.into(),
            staked: amount,
            penalties: 0,
            last_activity: 0,
        }
    }

    fn proof(implicated: &[&str]) -> ReorgProof {
        ReorgProof {
            old_tip: [1u8; 32],
            new_tip: [2u8; 32],
            fork_height: 900,
            implicated: implicated.iter().map(|s| ValidatorId::from(*s)).collect(),
        }
    }

    fn guard(stakes: Vec<ValidatorStake>) -> (ReorgGuard, Arc<InMemoryStakeStore>) {
        let store = Arc::new(InMemoryStakeStore::with_stakes(stakes));
        let guard = ReorgGuard::new(store.clone(), ReorgConfig::default())
            .unwrap()
            .with_clock(Arc::new(ManualTimeSource::new(1_700_000_000)));
        (guard, store)
    }

    #[test]
    fn test_shallow_reorg_accepted_untouched() {
        let (guard, store) = guard(vec![stake("v1", 100_000)]);
        let outcome = guard.evaluate(5, &proof(&["v1"])).unwrap();
        assert_eq!(outcome.decision, ReorgDecision::Accept);
        assert!(outcome.slashed.is_empty());
        assert_eq!(store.get(&"v1".into()).unwrap().unwrap().staked, 100_000);
    }

    #[test]
    fn test_medium_reorg_slashes_five_percent() {
        let (guard, store) = guard(vec![stake("v1", 100_000), stake("v2", 40_000)]);
        let outcome = guard.evaluate(50, &proof(&["v1"])).unwrap();

        assert_eq!(outcome.decision, ReorgDecision::AcceptWithPenalty);
        assert_eq!(outcome.slashed.len(), 1);
        assert_eq!(outcome.slashed[0].amount, 5_000);

        let v1 = store.get(&"v1".into()).unwrap().unwrap();
        assert_eq!(v1.staked, 95_000);
        assert_eq!(v1.penalties, 5_000);
        assert_eq!(v1.last_activity, 1_700_000_000);
        assert_eq!(store.get(&"v2".into()).unwrap().unwrap().staked, 40_000);
    }

    #[test]
    fn test_unattributed_reorg_slashes_active_set() {
        let (guard, store) = guard(vec![stake("v1", 100_000), stake("v2", 40_000)]);
        let outcome = guard.evaluate(50, &proof(&[])).unwrap();

        assert_eq!(outcome.slashed.len(), 2);
        assert_eq!(store.get(&"v1".into()).unwrap().unwrap().staked, 95_000);
        assert_eq!(store.get(&"v2".into()).unwrap().unwrap().staked, 38_000);
    }

    #[test]
    fn test_deep_reorg_halts_without_slashing() {
        let (guard, store) = guard(vec![stake("v1", 100_000)]);
        let outcome = guard.evaluate(150, &proof(&["v1"])).unwrap();
        assert_eq!(outcome.decision, ReorgDecision::EmergencyHalt);
        assert!(outcome.slashed.is_empty());
        assert_eq!(store.get(&"v1".into()).unwrap().unwrap().staked, 100_000);
    }

    #[test]
    fn test_boundaries() {
        let (guard, _) = guard(vec![]);
        assert_eq!(guard.classify(0), ReorgDecision::Accept);
        assert_eq!(guard.classify(10), ReorgDecision::Accept);
        assert_eq!(guard.classify(11), ReorgDecision::AcceptWithPenalty);
        assert_eq!(guard.classify(100), ReorgDecision::AcceptWithPenalty);
        assert_eq!(guard.classify(101), ReorgDecision::EmergencyHalt);
    }

    #[test]
    fn test_validator_below_floor_removed() {
        let (guard, store) = guard(vec![stake("small", 1_050)]);
        let outcome = guard.evaluate(20, &proof(&["small"])).unwrap();
        // 1050 - 52 = 998 < 1000
        assert_eq!(outcome.slashed[0].remaining, 998);
        assert_eq!(outcome.removed, vec![ValidatorId::from("small")]);
        assert!(store.get(&"small".into()).unwrap().is_none());
    }

    #[test]
    fn test_unknown_and_duplicate_validators() {
        let (guard, store) = guard(vec![stake("v1", 20_000)]);
        let outcome = guard
            .evaluate(30, &proof(&["ghost", "v1", "v1"]))
            .unwrap();
        assert_eq!(outcome.slashed.len(), 1);
        assert_eq!(store.get(&"v1".into()).unwrap().unwrap().staked, 19_000);
    }

    #[test]
    fn test_invalid_thresholds_rejected() {
        let config = ReorgConfig {
            acceptable_depth: 200,
            ..ReorgConfig::default()
        };
        assert!(ReorgGuard::new(Arc::new(InMemoryStakeStore::new()), config).is_err());
    }
}
