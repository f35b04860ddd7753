//! End-to-end merge-mining cycles through the orchestrator.

use std::sync::Arc;
use std::time::Duration;

use mb_01_parent_chain::ParentChainEvent;
use mb_02_child_production::{ChildBlockProducer, ChildProductionConfig, InMemoryTransactionPool};
use mb_03_pow_verification::{DifficultyVerifier, PowConfig, PrimaryHashAlgorithm};
use mb_04_chain_guards::{
    InMemoryStakeStore, InMemoryTimingStore, ReorgConfig, ReorgGuard, TimingAnomalyDetector,
    TimingConfig,
};
use mb_05_nullifier_registry::{InMemoryNullifierStore, NullifierConfig, NullifierRegistry};
use mb_06_merge_mining_proof::{verify_proof, DigestSigner, ProofBuilder};
use mb_07_submission::{
    MockDataAvailabilitySink, MockSettlementSink, SinkConfig, SubmissionConfig, SubmissionFanout,
};
use mb_08_finalization::{
    BridgeComponents, CycleOutcome, FinalizationConfig, FinalizationError,
    FinalizationOrchestrator, FinalizationState,
};
use shared_bus::{InMemoryEventBus, SinkKind};
use shared_types::{
    ChildBlock, ChildBlockStatus, FinalityLevel, ManualTimeSource, ParentBlockRef, ParentHeader,
    ReorgEvent, ReorgProof, ValidatorId, ZERO_HASH,
};
use tokio::sync::watch;

struct Bridge {
    orchestrator: FinalizationOrchestrator,
    da: Arc<MockDataAvailabilitySink>,
    settlement: Arc<MockSettlementSink>,
}

fn fast_sink(url: &str) -> SinkConfig {
    SinkConfig {
        max_attempts: 3,
        retry_delay_ms: 1,
        timeout_ms: 1_000,
        ..SinkConfig::with_url(url)
    }
}

fn bridge() -> Bridge {
    let bus = Arc::new(InMemoryEventBus::new());
    let da = Arc::new(MockDataAvailabilitySink::new());
    let settlement = Arc::new(MockSettlementSink::new());
    let submission = SubmissionConfig {
        da: fast_sink("http://da.invalid"),
        settlement: fast_sink("http://settlement.invalid"),
        ..SubmissionConfig::default()
    };
    let pow = PowConfig {
        max_primary_target: u64::MAX,
        max_auxiliary_target: u64::MAX,
        primary_algorithm: PrimaryHashAlgorithm::Sha256d,
        ..PowConfig::default()
    };

    let components = BridgeComponents {
        verifier: Arc::new(DifficultyVerifier::from_config(pow).unwrap()),
        timing: Arc::new(
            TimingAnomalyDetector::new(
                Arc::new(InMemoryTimingStore::new()),
                TimingConfig::default(),
            )
            .unwrap(),
        ),
        reorg: Arc::new(
            ReorgGuard::new(Arc::new(InMemoryStakeStore::new()), ReorgConfig::default()).unwrap(),
        ),
        registry: Arc::new(NullifierRegistry::new(
            Arc::new(InMemoryNullifierStore::new()),
            NullifierConfig::default(),
        )),
        proofs: ProofBuilder::default(),
        fanout: Arc::new(SubmissionFanout::new(
            da.clone(),
            settlement.clone(),
            submission,
            bus.clone(),
        )),
        events: bus,
    };

    let mut orchestrator = FinalizationOrchestrator::new(FinalizationConfig::default(), components)
        .with_clock(Arc::new(ManualTimeSource::new(1_700_000_000)));
    orchestrator.start();
    Bridge {
        orchestrator,
        da,
        settlement,
    }
}

async fn produce(start_height: u64, count: usize) -> Vec<ChildBlock> {
    let pool = Arc::new(InMemoryTransactionPool::new());
    let mut producer = ChildBlockProducer::new(
        pool,
        ChildProductionConfig {
            start_height,
            ..ChildProductionConfig::default()
        },
    )
    .with_clock(Arc::new(ManualTimeSource::new(1_700_000_000)));
    let mut blocks = Vec::with_capacity(count);
    for _ in 0..count {
        blocks.push(producer.produce_block().await);
    }
    blocks
}

fn parent(height: u64, primary_difficulty: u64) -> ParentBlockRef {
    ParentBlockRef {
        hash: [0xAB; 32],
        height,
        timestamp: 1_700_000_000 + height * 480,
        primary_difficulty,
        auxiliary_difficulty: None,
        header: ParentHeader {
            major_version: 1,
            minor_version: 0,
            previous_hash: ZERO_HASH,
            nonce: 42,
            aux_block_hash: None,
            external_commitment: None,
        },
    }
}

#[tokio::test]
async fn test_valid_parent_finalizes_three_blocks() {
    let mut bridge = bridge();
    let blocks = produce(101, 3).await;
    for block in blocks.clone() {
        bridge.orchestrator.accept_child_block(block).await.unwrap();
    }

    let CycleOutcome::Finalized { batch, submission } = bridge
        .orchestrator
        .on_parent_block(parent(5_000, u64::MAX))
        .await
        .unwrap()
    else {
        panic!("expected a finalized batch");
    };

    assert_eq!(batch.proof.child_block_count, 3);
    assert_eq!(
        batch.proof.child_block_hashes,
        blocks.iter().map(|b| b.hash()).collect::<Vec<_>>()
    );
    assert_eq!(batch.proof.parent_block_height, 5_000);
    assert!(batch
        .blocks
        .iter()
        .all(|b| b.status == ChildBlockStatus::Finalized));
    assert!(bridge.orchestrator.pending_blocks().is_empty());
    verify_proof(&batch.proof, &batch.blocks, &DigestSigner).unwrap();

    let record = submission.await.unwrap();
    assert!(record.da.is_success());
    assert!(record.settlement.is_success());
    assert_eq!(record.finality_level, FinalityLevel::SettlementFinalized);
}

#[tokio::test]
async fn test_invalid_pow_keeps_blocks_pending() {
    let mut bridge = bridge();
    for block in produce(101, 3).await {
        bridge.orchestrator.accept_child_block(block).await.unwrap();
    }

    let err = bridge
        .orchestrator
        .on_parent_block(parent(5_000, 1))
        .await
        .unwrap_err();
    assert!(err.is_parent_rejection());

    let pending = bridge.orchestrator.pending_blocks();
    assert_eq!(pending.len(), 3);
    assert!(pending.iter().all(ChildBlock::is_pending));
    assert_eq!(
        bridge.orchestrator.state(),
        FinalizationState::AwaitingParentBlock
    );
    assert_eq!(bridge.da.calls(), 0);
    assert_eq!(bridge.settlement.calls(), 0);
}

#[tokio::test]
async fn test_da_failure_does_not_undo_finalization() {
    let mut bridge = bridge();
    bridge.da.set_always_fail(true);
    for block in produce(101, 2).await {
        bridge.orchestrator.accept_child_block(block).await.unwrap();
    }

    let CycleOutcome::Finalized { batch, submission } = bridge
        .orchestrator
        .on_parent_block(parent(5_000, u64::MAX))
        .await
        .unwrap()
    else {
        panic!("expected a finalized batch");
    };
    let record = submission.await.unwrap();

    assert_eq!(record.failed_sinks(), vec![SinkKind::DataAvailability]);
    assert_eq!(record.da.attempts(), 3);
    assert!(record.settlement.is_success());
    assert_eq!(bridge.settlement.records().len(), 1);
    assert!(batch
        .blocks
        .iter()
        .all(|b| b.status == ChildBlockStatus::Finalized));
    assert_eq!(bridge.orchestrator.status().finalized_child_blocks, 2);

    let handle = bridge.orchestrator.handle();
    let audited = handle.submission_for(5_000).unwrap();
    assert_eq!(audited.failed_sinks(), vec![SinkKind::DataAvailability]);
}

#[tokio::test]
async fn test_each_block_finalized_at_most_once() {
    let mut bridge = bridge();
    let first = produce(101, 2).await;
    for block in first.clone() {
        bridge.orchestrator.accept_child_block(block).await.unwrap();
    }
    bridge
        .orchestrator
        .on_parent_block(parent(5_000, u64::MAX))
        .await
        .unwrap();

    for block in first {
        let err = bridge
            .orchestrator
            .accept_child_block(block)
            .await
            .unwrap_err();
        assert!(matches!(err, FinalizationError::DuplicateChildBlock { .. }));
    }

    for block in produce(103, 1).await {
        bridge.orchestrator.accept_child_block(block).await.unwrap();
    }
    let CycleOutcome::Finalized { batch, .. } = bridge
        .orchestrator
        .on_parent_block(parent(5_001, u64::MAX))
        .await
        .unwrap()
    else {
        panic!("expected a finalized batch");
    };
    assert_eq!(batch.blocks.len(), 1);
    assert_eq!(batch.blocks[0].height, 103);
    assert_eq!(bridge.orchestrator.status().finalized_child_blocks, 3);
}

#[tokio::test]
async fn test_run_loop_end_to_end() {
    let bridge = bridge();
    let handle = bridge.orchestrator.handle();
    let ((child_tx, child_rx), (parent_tx, parent_rx)) = bridge.orchestrator.channels();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(bridge.orchestrator.run(child_rx, parent_rx, shutdown_rx));

    for block in produce(101, 3).await {
        child_tx.send(block).await.unwrap();
    }
    parent_tx
        .send(ParentChainEvent::Reorg(ReorgEvent {
            depth: 150,
            proof: ReorgProof {
                old_tip: [1; 32],
                new_tip: [2; 32],
                fork_height: 4_850,
                implicated: vec![ValidatorId::from("unknown")],
            },
        }))
        .await
        .unwrap();
    parent_tx
        .send(ParentChainEvent::NewBlock(parent(5_000, u64::MAX)))
        .await
        .unwrap();

    let mut status = handle.subscribe_status();
    tokio::time::timeout(
        Duration::from_secs(5),
        status.wait_for(|s| s.is_halted() && s.pending_blocks == 3),
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(handle.refresh_status().await.unwrap().finalized_child_blocks, 0);

    assert!(handle.clear_halt().await.unwrap());
    parent_tx
        .send(ParentChainEvent::NewBlock(parent(5_001, u64::MAX)))
        .await
        .unwrap();
    tokio::time::timeout(
        Duration::from_secs(5),
        status.wait_for(|s| s.finalized_child_blocks == 3),
    )
    .await
    .unwrap()
    .unwrap();

    shutdown_tx.send(true).unwrap();
    task.await.unwrap();
    assert_eq!(handle.submissions().len(), 1);
    assert_eq!(
        handle.status().last_finalized_parent_height,
        Some(5_001)
    );
}
