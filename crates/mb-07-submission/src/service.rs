//! The submission fan-out.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use mb_06_merge_mining_proof::settlement_state_root;
use shared_bus::{BridgeEvent, EventPublisher, SinkKind};
use shared_types::{FinalizedBatch, Hash, SystemTimeSource, TimeSource};
use tracing::{error, info, warn};

use crate::audit::{finality_for, SinkOutcome, SubmissionAuditLog, SubmissionRecord};
use crate::config::{SinkConfig, SubmissionConfig};
use crate::domain::{DaBlob, DaReceipt, SettlementRecord};
use crate::error::{SubmissionError, SubmissionResult};
use crate::ports::{DataAvailabilitySink, SettlementSink};

/// Sends finalized batches to the DA and settlement sinks.
///
/// The two sinks run concurrently and independently. Each call is bounded by
/// the sink's timeout and retried with doubling delays up to `max_attempts`.
pub struct SubmissionFanout {
    da: Arc<dyn DataAvailabilitySink>,
    settlement: Arc<dyn SettlementSink>,
    config: SubmissionConfig,
    audit: Arc<SubmissionAuditLog>,
    events: Arc<dyn EventPublisher>,
    clock: Arc<dyn TimeSource>,
}

impl SubmissionFanout {
    /// Fan-out over the given sinks.
    pub fn new(
        da: Arc<dyn DataAvailabilitySink>,
        settlement: Arc<dyn SettlementSink>,
        config: SubmissionConfig,
        events: Arc<dyn EventPublisher>,
    ) -> Self {
        let audit = Arc::new(SubmissionAuditLog::with_capacity(config.audit_capacity));
        Self {
            da,
            settlement,
            config,
            audit,
            events,
            clock: Arc::new(SystemTimeSource),
        }
    }

    /// Replace the clock stamped on audit records.
    pub fn with_clock(mut self, clock: Arc<dyn TimeSource>) -> Self {
        self.clock = clock;
        self
    }

    /// Audit log shared with status readers.
    pub fn audit_log(&self) -> Arc<SubmissionAuditLog> {
        self.audit.clone()
    }

    /// Settings in use.
    pub fn config(&self) -> &SubmissionConfig {
        &self.config
    }

    /// Deliver `batch` to both sinks and record the outcome.
    ///
    /// Never fails: sink errors end up in the returned record.
    pub async fn submit(&self, batch: &FinalizedBatch) -> SubmissionRecord {
        let parent_height = batch.proof.parent_block_height;
        info!(
            "[mb-07] 📤 Submitting batch for parent {} ({} blocks)",
            parent_height,
            batch.blocks.len()
        );

        let ((da, da_inclusion_verified), settlement) =
            tokio::join!(self.deliver_da(batch), self.deliver_settlement(batch));

        let da_confirmed = da.is_success() && da_inclusion_verified.unwrap_or(true);
        let record = SubmissionRecord {
            parent_height,
            parent_hash: batch.proof.parent_block_hash,
            attempts: da.attempts() + settlement.attempts(),
            finality_level: finality_for(da_confirmed, settlement.is_success()),
            da,
            da_inclusion_verified,
            settlement,
            completed_at: self.clock.now(),
        };

        for sink in [SinkKind::DataAvailability, SinkKind::Settlement] {
            let outcome = record.outcome(sink);
            let detail = match outcome {
                SinkOutcome::Delivered { reference, .. } => reference.clone(),
                SinkOutcome::Failed { error, .. } => error.clone(),
            };
            self.events
                .publish(BridgeEvent::SubmissionCompleted {
                    parent_height,
                    sink,
                    success: outcome.is_success(),
                    attempts: outcome.attempts(),
                    detail,
                })
                .await;
        }

        info!(
            "[mb-07] Batch for parent {} reached {:?}",
            parent_height, record.finality_level
        );
        self.audit.record(record.clone());
        record
    }

    async fn deliver_da(&self, batch: &FinalizedBatch) -> (SinkOutcome, Option<bool>) {
        let namespace = self.config.namespace.as_str();
        let bytes = match DaBlob::from_batch(namespace, batch).encode() {
            Ok(bytes) => bytes,
            Err(e) => {
                error!("[mb-07] DA blob encoding failed: {}", e);
                return (
                    SinkOutcome::Failed {
                        attempts: 0,
                        error: e.to_string(),
                    },
                    None,
                );
            }
        };

        let (result, attempts) = with_retry(SinkKind::DataAvailability, &self.config.da, || {
            self.da.submit_blob(namespace, &bytes)
        })
        .await;

        match result {
            Ok(DaReceipt { height, commitment }) => {
                info!(
                    "[mb-07] ✅ DA blob at height {} (commitment {})",
                    height, commitment
                );
                let verified = if self.config.verify_da_inclusion {
                    Some(self.check_inclusion(height, &DaBlob::content_hash(&bytes)).await)
                } else {
                    None
                };
                (
                    SinkOutcome::Delivered {
                        attempts,
                        reference: height.to_string(),
                    },
                    verified,
                )
            }
            Err(e) => {
                warn!("[mb-07] ❌ DA submission failed after {} attempts: {}", attempts, e);
                (
                    SinkOutcome::Failed {
                        attempts,
                        error: e.to_string(),
                    },
                    None,
                )
            }
        }
    }

    async fn deliver_settlement(&self, batch: &FinalizedBatch) -> SinkOutcome {
        let state_root = match settlement_state_root(&batch.blocks) {
            Ok(root) => root,
            Err(e) => {
                error!("[mb-07] Settlement state root failed: {}", e);
                return SinkOutcome::Failed {
                    attempts: 0,
                    error: e.to_string(),
                };
            }
        };
        let record = SettlementRecord {
            state_root,
            block_count: batch.blocks.len() as u64,
            parent_proof: batch.proof.clone(),
        };

        let (result, attempts) = with_retry(SinkKind::Settlement, &self.config.settlement, || {
            self.settlement.submit(record.clone())
        })
        .await;

        match result {
            Ok(receipt) => {
                info!("[mb-07] ✅ Settlement tx {}", receipt.tx_id);
                SinkOutcome::Delivered {
                    attempts,
                    reference: receipt.tx_id,
                }
            }
            Err(e) => {
                warn!(
                    "[mb-07] ❌ Settlement submission failed after {} attempts: {}",
                    attempts, e
                );
                SinkOutcome::Failed {
                    attempts,
                    error: e.to_string(),
                }
            }
        }
    }

    async fn check_inclusion(&self, height: u64, expected: &Hash) -> bool {
        let namespace = self.config.namespace.as_str();
        match tokio::time::timeout(
            self.config.da.timeout(),
            self.da.verify_inclusion(height, namespace, expected),
        )
        .await
        {
            Ok(Ok(true)) => true,
            Ok(Ok(false)) => {
                warn!("[mb-07] DA blob at height {} does not match", height);
                false
            }
            Ok(Err(e)) => {
                warn!("[mb-07] DA inclusion check at {} failed: {}", height, e);
                false
            }
            Err(_) => {
                warn!("[mb-07] DA inclusion check at {} timed out", height);
                false
            }
        }
    }

    /// Poll `verify_inclusion` until it holds or `attempts` run out.
    pub async fn wait_for_inclusion(
        &self,
        height: u64,
        expected_hash: &Hash,
        attempts: u32,
        interval: Duration,
    ) -> SubmissionResult<bool> {
        let namespace = self.config.namespace.as_str();
        let mut last_err = None;
        for attempt in 1..=attempts.max(1) {
            match self.da.verify_inclusion(height, namespace, expected_hash).await {
                Ok(true) => return Ok(true),
                Ok(false) => return Ok(false),
                Err(e) if e.is_transient() => last_err = Some(e),
                Err(e) => return Err(e),
            }
            if attempt < attempts {
                tokio::time::sleep(interval).await;
            }
        }
        match last_err {
            Some(SubmissionError::BlobNotFound(_)) | None => Ok(false),
            Some(e) => Err(e),
        }
    }
}

/// Run `op` under the sink timeout, retrying transient failures.
///
/// Returns the final result and the number of calls made.
async fn with_retry<T, F, Fut>(
    sink: SinkKind,
    config: &SinkConfig,
    mut op: F,
) -> (SubmissionResult<T>, u32)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = SubmissionResult<T>>,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 0;
    loop {
        attempt += 1;
        let err = match tokio::time::timeout(config.timeout(), op()).await {
            Ok(Ok(value)) => return (Ok(value), attempt),
            Ok(Err(e)) => e,
            Err(_) => SubmissionError::Timeout(config.timeout_ms),
        };

        if !err.is_transient() || attempt >= max_attempts {
            return (Err(err), attempt);
        }
        let delay = config.retry_delay(attempt);
        warn!(
            "[mb-07] {} attempt {}/{} failed: {}; retrying in {:?}",
            sink, attempt, max_attempts, err, delay
        );
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{MockDataAvailabilitySink, MockSettlementSink};
    use mb_06_merge_mining_proof::ProofBuilder;
    use shared_bus::{EventFilter, InMemoryEventBus};
    use shared_types::{
        ChildBlock, ChildBlockStatus, FinalityLevel, ParentBlockRef, ParentHeader,
        DEFAULT_GAS_LIMIT, ZERO_HASH,
    };

    fn batch(parent_height: u64) -> FinalizedBatch {
        let blocks: Vec<ChildBlock> = (1..=3)
            .map(|h| ChildBlock {
                height: h,
                timestamp: 1_000 + h * 8,
                transactions: vec![],
                previous_hash: ZERO_HASH,
                merkle_root: ZERO_HASH,
                gas_used: 0,
                gas_limit: DEFAULT_GAS_LIMIT,
                status: ChildBlockStatus::Finalized,
            })
            .collect();
        let parent = ParentBlockRef {
            hash: [4u8; 32],
            height: parent_height,
            timestamp: 2_000,
            primary_difficulty: 0x0fff,
            auxiliary_difficulty: None,
            header: ParentHeader {
                major_version: 1,
                minor_version: 0,
                previous_hash: [3u8; 32],
                nonce: 9,
                aux_block_hash: None,
                external_commitment: None,
            },
        };
        FinalizedBatch {
            proof: ProofBuilder::default().build_proof(&parent, &blocks),
            blocks,
            rejected_claims: vec![],
            finalized_at: 2_001,
        }
    }

    struct Harness {
        fanout: SubmissionFanout,
        da: Arc<MockDataAvailabilitySink>,
        settlement: Arc<MockSettlementSink>,
        bus: Arc<InMemoryEventBus>,
    }

    fn harness() -> Harness {
        let da = Arc::new(MockDataAvailabilitySink::new());
        let settlement = Arc::new(MockSettlementSink::new());
        let bus = Arc::new(InMemoryEventBus::new());
        let mut config = SubmissionConfig::default();
        config.da.timeout_ms = 1_000;
        config.settlement.timeout_ms = 1_000;
        let fanout = SubmissionFanout::new(da.clone(), settlement.clone(), config, bus.clone());
        Harness {
            fanout,
            da,
            settlement,
            bus,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_both_sinks_succeed() {
        let h = harness();
        let record = h.fanout.submit(&batch(500)).await;

        assert!(record.da.is_success());
        assert!(record.settlement.is_success());
        assert_eq!(record.da_inclusion_verified, Some(true));
        assert_eq!(record.finality_level, FinalityLevel::SettlementFinalized);
        assert_eq!(record.attempts, 2);
        assert_eq!(h.da.blob_count(), 1);

        let settled = h.settlement.records();
        assert_eq!(settled.len(), 1);
        assert_eq!(settled[0].block_count, 3);
        assert_eq!(
            settled[0].state_root,
            settlement_state_root(&batch(500).blocks).unwrap()
        );
        assert_eq!(h.fanout.audit_log().for_parent(500), Some(record));
    }

    #[tokio::test(start_paused = true)]
    async fn test_da_failure_isolated_from_settlement() {
        let h = harness();
        let mut sub = h.bus.subscribe(EventFilter::all());
        h.da.set_always_fail(true);

        let record = h.fanout.submit(&batch(501)).await;

        assert_eq!(
            record.da,
            SinkOutcome::Failed {
                attempts: 3,
                error: "Sink transport error: da unavailable".into()
            }
        );
        assert!(record.settlement.is_success());
        assert_eq!(record.failed_sinks(), vec![SinkKind::DataAvailability]);
        assert_eq!(record.finality_level, FinalityLevel::SettlementFinalized);
        assert_eq!(h.da.calls(), 3);
        assert_eq!(h.settlement.calls(), 1);

        let events = sub.drain();
        let failures: Vec<_> = events
            .iter()
            .filter(|e| {
                matches!(
                    e,
                    BridgeEvent::SubmissionCompleted { success: false, .. }
                )
            })
            .collect();
        assert_eq!(failures.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failure_retried() {
        let h = harness();
        h.settlement.fail_next(2);
        let record = h.fanout.submit(&batch(502)).await;
        assert_eq!(record.settlement.attempts(), 3);
        assert!(record.settlement.is_success());
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_sink_times_out() {
        let h = harness();
        h.settlement.set_hang(true);
        let record = h.fanout.submit(&batch(503)).await;
        assert_eq!(
            record.settlement,
            SinkOutcome::Failed {
                attempts: 3,
                error: "Sink call timed out after 1000ms".into()
            }
        );
        assert!(record.da.is_success());
        assert_eq!(record.finality_level, FinalityLevel::DaConfirmed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_inclusion() {
        let h = harness();
        h.fanout.submit(&batch(504)).await;
        let blob = DaBlob::from_batch(&h.fanout.config().namespace, &batch(504))
            .encode()
            .unwrap();
        let hash = DaBlob::content_hash(&blob);

        assert!(h
            .fanout
            .wait_for_inclusion(1, &hash, 3, Duration::from_secs(2))
            .await
            .unwrap());
        assert!(!h
            .fanout
            .wait_for_inclusion(99, &hash, 3, Duration::from_secs(2))
            .await
            .unwrap());

        h.da.corrupt(1, &h.fanout.config().namespace);
        assert!(!h
            .fanout
            .wait_for_inclusion(1, &hash, 1, Duration::from_secs(2))
            .await
            .unwrap());
    }
}
