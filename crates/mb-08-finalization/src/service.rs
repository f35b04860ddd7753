//! Finalization Orchestrator - the synchronization point of the bridge.
//!
//! Sole owner of the pending buffer. Child blocks and parent chain events
//! arrive over bounded channels; everything else is called directly.

use std::sync::Arc;

use mb_01_parent_chain::ParentChainEvent;
use mb_03_pow_verification::DifficultyVerifier;
use mb_04_chain_guards::{ReorgGuard, ReorgOutcome, TimingAnomalyDetector, TimingPolicy};
use mb_05_nullifier_registry::{ClaimError, NullifierRegistry};
use mb_06_merge_mining_proof::ProofBuilder;
use mb_07_submission::{SubmissionFanout, SubmissionRecord};
use shared_bus::{BridgeEvent, EventPublisher};
use shared_types::{
    short_hex, ChildBlock, ChildBlockStatus, FinalizedBatch, ParentBlockRef, ReorgDecision,
    ReorgEvent, RejectedClaim, SystemTimeSource, TimeSource,
};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::FinalizationConfig;
use crate::domain::{
    BridgeStatus, FinalizationEvent, FinalizationState, FinalizedWatermark, PendingBuffer,
    ReorgCounts, StateMachine,
};
use crate::error::{FinalizationError, FinalizationResult};
use crate::handle::{FinalizationHandle, OrchestratorCommand};
use crate::metrics;

/// Collaborators the orchestrator drives.
#[derive(Clone)]
pub struct BridgeComponents {
    /// Parent block work checks.
    pub verifier: Arc<DifficultyVerifier>,
    /// Parent interval scoring.
    pub timing: Arc<TimingAnomalyDetector>,
    /// Reorg depth policy and slashing.
    pub reorg: Arc<ReorgGuard>,
    /// One-time claim registry.
    pub registry: Arc<NullifierRegistry>,
    /// Proof construction.
    pub proofs: ProofBuilder,
    /// Downstream delivery.
    pub fanout: Arc<SubmissionFanout>,
    /// Event bus.
    pub events: Arc<dyn EventPublisher>,
}

/// Result of handling one parent block.
#[derive(Debug)]
pub enum CycleOutcome {
    /// The buffer was empty; the parent height was recorded, nothing else.
    Empty {
        /// Parent height
        parent_height: u64,
    },
    /// Blocks were finalized and handed to the fan-out.
    Finalized {
        /// The committed batch
        batch: FinalizedBatch,
        /// Background submission; resolves to its audit record
        submission: JoinHandle<SubmissionRecord>,
    },
}

#[derive(Debug, Default)]
struct Counters {
    finalized_child_blocks: u64,
    proofs_built: u64,
    rejected_parent_blocks: u64,
    timing_anomalies: u64,
    rejected_claims: u64,
    reorgs: ReorgCounts,
}

/// Drives the merge-mining cycle.
pub struct FinalizationOrchestrator {
    config: FinalizationConfig,
    components: BridgeComponents,
    clock: Arc<dyn TimeSource>,
    machine: StateMachine,
    buffer: PendingBuffer,
    finalized: FinalizedWatermark,
    last_finalized_parent: Option<u64>,
    counters: Counters,
    status_tx: watch::Sender<BridgeStatus>,
    command_tx: mpsc::Sender<OrchestratorCommand>,
    command_rx: Option<mpsc::Receiver<OrchestratorCommand>>,
}

impl FinalizationOrchestrator {
    /// Orchestrator in `Idle`.
    pub fn new(config: FinalizationConfig, components: BridgeComponents) -> Self {
        let (status_tx, _) = watch::channel(BridgeStatus::default());
        let (command_tx, command_rx) = mpsc::channel(16);
        Self {
            config,
            components,
            clock: Arc::new(SystemTimeSource),
            machine: StateMachine::new(),
            buffer: PendingBuffer::new(),
            finalized: FinalizedWatermark::new(),
            last_finalized_parent: None,
            counters: Counters::default(),
            status_tx,
            command_tx,
            command_rx: Some(command_rx),
        }
    }

    /// Replace the clock stamped on finalized batches.
    pub fn with_clock(mut self, clock: Arc<dyn TimeSource>) -> Self {
        self.clock = clock;
        self
    }

    /// Resume after a restart with the last finalized parent height.
    pub fn with_last_finalized(mut self, parent_height: Option<u64>) -> Self {
        self.last_finalized_parent = parent_height;
        self
    }

    /// Handle for status reads and operator commands.
    pub fn handle(&self) -> FinalizationHandle {
        FinalizationHandle::new(
            self.status_tx.subscribe(),
            self.command_tx.clone(),
            self.components.fanout.audit_log(),
        )
    }

    /// Current state.
    pub fn state(&self) -> FinalizationState {
        self.machine.state()
    }

    /// Buffered blocks, oldest first.
    pub fn pending_blocks(&self) -> &[ChildBlock] {
        self.buffer.blocks()
    }

    /// `Idle -> AwaitingParentBlock`.
    pub fn start(&mut self) {
        self.transition(FinalizationEvent::Start);
        info!("[mb-08] 🚀 Orchestrator awaiting parent blocks");
    }

    /// Append a freshly produced child block to the buffer.
    ///
    /// Accepted in every state, including `Halted`.
    pub async fn accept_child_block(&mut self, block: ChildBlock) -> FinalizationResult<()> {
        let hash = block.hash();
        if block.status != ChildBlockStatus::Pending
            || self.finalized.covers(block.height)
            || self.buffer.contains(&hash)
        {
            warn!(
                "[mb-08] Refusing child block {} ({}): already seen",
                block.height,
                short_hex(&hash)
            );
            return Err(FinalizationError::DuplicateChildBlock {
                height: block.height,
            });
        }

        let height = block.height;
        let tx_count = block.transactions.len();
        self.buffer.push(block);
        debug!(
            "[mb-08] Buffered child {} ({} txs), buffer {}",
            height,
            tx_count,
            self.buffer.len()
        );
        metrics::set_pending_blocks(self.buffer.len());

        self.components
            .events
            .publish(BridgeEvent::ChildBlockBuffered {
                height,
                block_hash: hash,
                tx_count,
                buffer_size: self.buffer.len(),
            })
            .await;
        self.publish_status();
        Ok(())
    }

    /// Run one merge-mining cycle for `parent`.
    pub async fn on_parent_block(
        &mut self,
        parent: ParentBlockRef,
    ) -> FinalizationResult<CycleOutcome> {
        if self.machine.is_halted() {
            debug!("[mb-08] Halted, ignoring parent {}", parent.height);
            return Err(FinalizationError::Halted);
        }
        if let Some(last) = self.last_finalized_parent {
            if parent.height <= last {
                debug!(
                    "[mb-08] Parent {} not above last finalized {}, ignoring",
                    parent.height, last
                );
                return Err(FinalizationError::StaleParent {
                    height: parent.height,
                    last_finalized: last,
                });
            }
        }

        if self.machine.state() == FinalizationState::Idle {
            self.transition(FinalizationEvent::Start);
        }
        self.transition(FinalizationEvent::ParentArrived);
        info!(
            "[mb-08] ⛏️ Parent block {} ({}) arrived, {} child blocks pending",
            parent.height,
            short_hex(&parent.hash),
            self.buffer.len()
        );

        if let Err(e) = self.verify(&parent).await {
            self.counters.rejected_parent_blocks += 1;
            metrics::record_parent_rejected(match &e {
                FinalizationError::TimingAnomaly { .. } => "timing",
                FinalizationError::VerificationTask(_) => "task",
                _ => "pow",
            });
            warn!("[mb-08] ❌ {}", e);
            self.components
                .events
                .publish(BridgeEvent::ParentBlockRejected {
                    parent_height: parent.height,
                    parent_hash: parent.hash,
                    reason: e.to_string(),
                })
                .await;
            self.transition(FinalizationEvent::VerificationFailed);
            self.publish_status();
            return Err(e);
        }

        self.transition(FinalizationEvent::Verified);
        let outcome = self.commit(&parent).await;
        self.publish_status();
        Ok(outcome)
    }

    async fn verify(&mut self, parent: &ParentBlockRef) -> FinalizationResult<()> {
        let verifier = self.components.verifier.clone();
        let timing = self.components.timing.clone();
        let pow_parent = parent.clone();
        let nonce = parent.header.nonce;

        let pow_task = tokio::task::spawn_blocking(move || verifier.check(&pow_parent, nonce));
        let timing_task = async {
            timing.assess(parent.height, parent.timestamp, parent.primary_difficulty)
        };
        let (pow, timing_report) = tokio::join!(pow_task, timing_task);

        let timing_policy = self.components.timing.config().policy;
        let anomaly = match timing_report {
            Ok(report) if report.anomalous => {
                self.counters.timing_anomalies += 1;
                metrics::record_timing_anomaly();
                self.components
                    .events
                    .publish(BridgeEvent::TimingAnomaly {
                        parent_height: parent.height,
                        interval_secs: report.interval_secs.unwrap_or_default(),
                        score: report.score,
                    })
                    .await;
                Some(report.score)
            }
            Ok(_) => None,
            Err(e) => {
                warn!("[mb-08] Timing check unavailable for {}: {}", parent.height, e);
                None
            }
        };

        match pow {
            Err(join_err) => {
                error!("[mb-08] PoW task failed: {}", join_err);
                return Err(FinalizationError::VerificationTask(join_err.to_string()));
            }
            Ok(Err(e)) => {
                return Err(FinalizationError::PowInvalid {
                    height: parent.height,
                    reason: e.to_string(),
                });
            }
            Ok(Ok(report)) => debug!(
                "[mb-08] PoW ok for {} (primary {:#x})",
                parent.height, report.primary_value
            ),
        }

        if let (Some(score), TimingPolicy::Reject) = (anomaly, timing_policy) {
            return Err(FinalizationError::TimingAnomaly {
                height: parent.height,
                score,
            });
        }
        Ok(())
    }

    async fn commit(&mut self, parent: &ParentBlockRef) -> CycleOutcome {
        let mut blocks = self.buffer.take_all();
        self.last_finalized_parent = Some(parent.height);
        metrics::set_pending_blocks(0);

        if blocks.is_empty() {
            info!("[mb-08] No child blocks pending at parent {}", parent.height);
            self.transition(FinalizationEvent::NothingToCommit);
            return CycleOutcome::Empty {
                parent_height: parent.height,
            };
        }

        let rejected_claims = self.record_claims(&blocks).await;
        let proof = self.components.proofs.build_proof(parent, &blocks);

        for block in &mut blocks {
            block.status = ChildBlockStatus::Finalized;
            self.finalized.advance(block.height);
        }
        self.counters.finalized_child_blocks += blocks.len() as u64;
        self.counters.proofs_built += 1;
        metrics::record_batch_finalized(blocks.len());

        info!(
            "[mb-08] ✅ Finalized {} child blocks at parent {} (root {}, {} claims rejected)",
            blocks.len(),
            parent.height,
            short_hex(&proof.child_blocks_merkle_root),
            rejected_claims.len()
        );
        self.components
            .events
            .publish(BridgeEvent::BatchFinalized {
                parent_height: parent.height,
                parent_hash: parent.hash,
                child_count: blocks.len(),
                merkle_root: proof.child_blocks_merkle_root,
            })
            .await;

        let batch = FinalizedBatch {
            proof,
            blocks,
            rejected_claims,
            finalized_at: self.clock.now(),
        };
        self.transition(FinalizationEvent::Committed);

        let submission = self.spawn_submission(batch.clone());
        self.transition(FinalizationEvent::Submitted);
        self.transition(FinalizationEvent::Start);

        CycleOutcome::Finalized { batch, submission }
    }

    async fn record_claims(&mut self, blocks: &[ChildBlock]) -> Vec<RejectedClaim> {
        let registry = &self.components.registry;
        let mut rejected = Vec::new();

        for block in blocks {
            for (tx, claim) in block.claims() {
                let attempt = || {
                    registry.record_claim(claim.nullifier_id, tx.hash, &claim.recipient, block.height)
                };
                let result = match attempt() {
                    Err(ClaimError::PendingTimeout { .. }) => attempt(),
                    other => other,
                };
                if let Err(e) = result {
                    warn!(
                        "[mb-08] Claim {} in tx {} rejected: {}",
                        short_hex(&claim.nullifier_id),
                        short_hex(&tx.hash),
                        e
                    );
                    self.components
                        .events
                        .publish(BridgeEvent::ClaimRejected {
                            nullifier_id: claim.nullifier_id,
                            tx_hash: tx.hash,
                            reason: e.to_string(),
                        })
                        .await;
                    rejected.push(RejectedClaim {
                        nullifier_id: claim.nullifier_id,
                        tx_hash: tx.hash,
                        child_height: block.height,
                        reason: e.to_string(),
                    });
                }
            }
        }

        self.counters.rejected_claims += rejected.len() as u64;
        rejected
    }

    fn spawn_submission(&self, batch: FinalizedBatch) -> JoinHandle<SubmissionRecord> {
        let fanout = self.components.fanout.clone();
        let registry = self.components.registry.clone();
        tokio::spawn(async move {
            let record = fanout.submit(&batch).await;
            if record.settlement.is_success() {
                if let Err(e) = registry.confirm_all(&batch.accepted_nullifiers()) {
                    warn!(
                        "[mb-08] Could not confirm nullifiers for parent {}: {}",
                        record.parent_height, e
                    );
                }
            }
            record
        })
    }

    /// Apply the reorg guard to `event`.
    ///
    /// `Ok` for accepted reorgs, `ReorgPenalty` when slashing was applied and
    /// `EmergencyHalt` when the bridge stopped.
    pub async fn on_reorg(&mut self, event: ReorgEvent) -> FinalizationResult<ReorgOutcome> {
        let outcome = self.components.reorg.evaluate(event.depth, &event.proof)?;
        self.counters.reorgs.record(outcome.decision);
        metrics::record_reorg(match outcome.decision {
            ReorgDecision::Accept => "accept",
            ReorgDecision::AcceptWithPenalty => "penalty",
            ReorgDecision::EmergencyHalt => "halt",
        });

        self.components
            .events
            .publish(BridgeEvent::ReorgEvaluated {
                depth: event.depth,
                decision: outcome.decision,
                slashed: outcome.slashed.len(),
                removed: outcome.removed.len(),
            })
            .await;

        let result = match outcome.decision {
            ReorgDecision::Accept => Ok(outcome),
            ReorgDecision::AcceptWithPenalty => Err(FinalizationError::ReorgPenalty {
                depth: event.depth,
                slashed: outcome.slashed.len(),
                removed: outcome.removed.len(),
            }),
            ReorgDecision::EmergencyHalt => {
                self.transition(FinalizationEvent::EmergencyHalt);
                error!(
                    "[mb-08] 🛑 EMERGENCY HALT: reorg depth {} from fork at {}",
                    event.depth, event.proof.fork_height
                );
                self.components
                    .events
                    .publish(BridgeEvent::EmergencyHalt {
                        depth: event.depth,
                        reason: format!(
                            "reorg of depth {} from fork height {}",
                            event.depth, event.proof.fork_height
                        ),
                    })
                    .await;
                Err(FinalizationError::EmergencyHalt { depth: event.depth })
            }
        };
        self.publish_status();
        result
    }

    /// Leave `Halted`. Returns `false` if the bridge was not halted.
    pub async fn clear_halt(&mut self) -> bool {
        if !self.machine.is_halted() {
            return false;
        }
        self.transition(FinalizationEvent::OperatorClear);
        info!("[mb-08] Halt cleared by operator");
        self.components.events.publish(BridgeEvent::HaltCleared).await;
        self.publish_status();
        true
    }

    /// Snapshot of the current status.
    pub fn status(&self) -> BridgeStatus {
        let nullifier_count = self.components.registry.len().unwrap_or_else(|e| {
            warn!("[mb-08] Nullifier count unavailable: {}", e);
            0
        });
        BridgeStatus {
            state: self.machine.state(),
            pending_blocks: self.buffer.len(),
            last_finalized_parent_height: self.last_finalized_parent,
            nullifier_count,
            reorgs: self.counters.reorgs,
            finalized_child_blocks: self.counters.finalized_child_blocks,
            proofs_built: self.counters.proofs_built,
            rejected_parent_blocks: self.counters.rejected_parent_blocks,
            timing_anomalies: self.counters.timing_anomalies,
            rejected_claims: self.counters.rejected_claims,
        }
    }

    fn transition(&mut self, event: FinalizationEvent) {
        let state = self.machine.process_event(event);
        metrics::set_state(state.as_gauge(), state == FinalizationState::Halted);
    }

    fn publish_status(&self) {
        self.status_tx.send_replace(self.status());
    }

    async fn handle_parent_event(
        &mut self,
        event: ParentChainEvent,
    ) -> Option<JoinHandle<SubmissionRecord>> {
        match event {
            ParentChainEvent::NewBlock(parent) => match self.on_parent_block(parent).await {
                Ok(CycleOutcome::Finalized { submission, .. }) => Some(submission),
                Ok(CycleOutcome::Empty { .. }) => None,
                Err(FinalizationError::Halted | FinalizationError::StaleParent { .. }) => None,
                Err(e) if e.is_parent_rejection() => None,
                Err(e) => {
                    warn!("[mb-08] Cycle failed: {}", e);
                    None
                }
            },
            ParentChainEvent::Reorg(reorg) => {
                match self.on_reorg(reorg).await {
                    Err(e) if e.is_fatal() => error!("[mb-08] {}", e),
                    Err(e) => warn!("[mb-08] {}", e),
                    Ok(_) => {}
                }
                None
            }
        }
    }

    /// Main loop. Returns when shutdown is signalled or both inputs close.
    ///
    /// Submissions still in flight get `shutdown_grace` to finish.
    pub async fn run(
        mut self,
        mut child_rx: mpsc::Receiver<ChildBlock>,
        mut parent_rx: mpsc::Receiver<ParentChainEvent>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let Some(mut command_rx) = self.command_rx.take() else {
            error!("[mb-08] Orchestrator already running");
            return;
        };
        self.start();
        self.publish_status();

        let mut in_flight: Vec<JoinHandle<SubmissionRecord>> = Vec::new();
        let mut child_open = true;
        let mut parent_open = true;

        while child_open || parent_open {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("[mb-08] Shutdown signal received");
                        break;
                    }
                }
                block = child_rx.recv(), if child_open => match block {
                    Some(block) => {
                        if let Err(e) = self.accept_child_block(block).await {
                            debug!("[mb-08] {}", e);
                        }
                    }
                    None => child_open = false,
                },
                event = parent_rx.recv(), if parent_open => match event {
                    Some(event) => {
                        if let Some(handle) = self.handle_parent_event(event).await {
                            in_flight.push(handle);
                        }
                    }
                    None => parent_open = false,
                },
                Some(command) = command_rx.recv() => match command {
                    OrchestratorCommand::ClearHalt(reply) => {
                        let cleared = self.clear_halt().await;
                        let _ = reply.send(cleared);
                    }
                    OrchestratorCommand::Status(reply) => {
                        let _ = reply.send(self.status());
                    }
                },
            }
            in_flight.retain(|h| !h.is_finished());
        }

        if !in_flight.is_empty() {
            info!(
                "[mb-08] Waiting up to {:?} for {} in-flight submissions",
                self.config.shutdown_grace(),
                in_flight.len()
            );
            let drain = futures::future::join_all(in_flight);
            if tokio::time::timeout(self.config.shutdown_grace(), drain)
                .await
                .is_err()
            {
                warn!("[mb-08] In-flight submissions did not finish within grace period");
            }
        }
        self.publish_status();
        info!("[mb-08] Orchestrator stopped");
    }

    /// Input channels sized by `channel_capacity`.
    pub fn channels(
        &self,
    ) -> (
        (mpsc::Sender<ChildBlock>, mpsc::Receiver<ChildBlock>),
        (mpsc::Sender<ParentChainEvent>, mpsc::Receiver<ParentChainEvent>),
    ) {
        let capacity = self.config.channel_capacity.max(1);
        (mpsc::channel(capacity), mpsc::channel(capacity))
    }
}
