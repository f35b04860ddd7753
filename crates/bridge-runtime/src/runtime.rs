//! Subsystem wiring and task supervision.
//!
//! ```text
//!   ChildBlockProducer ──mpsc<ChildBlock>────────┐
//!                                                ▼
//!   ParentChainPoller ──mpsc<ParentChainEvent>─▶ FinalizationOrchestrator ──▶ SubmissionFanout
//!                                                │                              ├─▶ DA sink
//!                                                ▼                              └─▶ settlement sink
//!                                         FinalizationHandle ──▶ status HTTP
//! ```

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use mb_01_parent_chain::{JsonRpcParentChainClient, ParentChainClient, ParentChainPoller};
use mb_02_child_production::{ChildBlockProducer, InMemoryTransactionPool, TransactionPool};
use mb_03_pow_verification::DifficultyVerifier;
use mb_04_chain_guards::{
    InMemoryStakeStore, InMemoryTimingStore, ReorgGuard, StakeStore, TimingAnomalyDetector,
};
use mb_05_nullifier_registry::{NullifierRegistry, NullifierStore};
use mb_06_merge_mining_proof::{DigestSigner, Ed25519ProofSigner, ProofBuilder, ProofSigner};
use mb_07_submission::{
    DataAvailabilitySink, JsonRpcDataAvailabilitySink, JsonRpcSettlementSink, SettlementSink,
    SubmissionFanout,
};
use mb_08_finalization::{BridgeComponents, FinalizationHandle, FinalizationOrchestrator};
use shared_bus::{EventFilter, InMemoryEventBus, Subscription};
use shared_types::ValidatorStake;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::config::BridgeConfig;
use crate::status;

/// Extra time allowed on top of the orchestrator's grace period.
const SHUTDOWN_SLACK: Duration = Duration::from_secs(5);

/// External systems the bridge talks to.
pub struct BridgeAdapters<C, P> {
    /// Parent chain node.
    pub parent: Arc<C>,
    /// Child transaction source.
    pub pool: Arc<P>,
    /// Data-availability layer.
    pub da: Arc<dyn DataAvailabilitySink>,
    /// Settlement layer.
    pub settlement: Arc<dyn SettlementSink>,
    /// Nullifier persistence.
    pub nullifiers: Arc<dyn NullifierStore>,
}

impl BridgeAdapters<JsonRpcParentChainClient, InMemoryTransactionPool> {
    /// JSON-RPC clients and on-disk nullifier storage from `config`.
    pub fn from_config(config: &BridgeConfig) -> Result<Self> {
        let parent = JsonRpcParentChainClient::new(&config.parent)
            .context("Failed to create parent chain client")?;
        let da = JsonRpcDataAvailabilitySink::new(&config.submission.da)
            .context("Failed to create DA client")?;
        let settlement = JsonRpcSettlementSink::new(&config.submission.settlement)
            .context("Failed to create settlement client")?;

        Ok(Self {
            parent: Arc::new(parent),
            pool: Arc::new(InMemoryTransactionPool::new()),
            da: Arc::new(da),
            settlement: Arc::new(settlement),
            nullifiers: open_nullifier_store(config)?,
        })
    }
}

#[cfg(not(feature = "rocksdb"))]
fn open_nullifier_store(config: &BridgeConfig) -> Result<Arc<dyn NullifierStore>> {
    use mb_05_nullifier_registry::FileNullifierStore;

    std::fs::create_dir_all(&config.node.data_dir)
        .with_context(|| format!("Failed to create data dir {:?}", config.node.data_dir))?;
    let path = config.node.data_dir.join(&config.nullifier.snapshot_file);
    let store = FileNullifierStore::open(&path)
        .with_context(|| format!("Failed to open nullifier snapshot {:?}", path))?;
    info!("[runtime] Nullifier snapshot at {:?}", path);
    Ok(Arc::new(store))
}

#[cfg(feature = "rocksdb")]
fn open_nullifier_store(config: &BridgeConfig) -> Result<Arc<dyn NullifierStore>> {
    use mb_05_nullifier_registry::RocksDbNullifierStore;

    std::fs::create_dir_all(&config.node.data_dir)
        .with_context(|| format!("Failed to create data dir {:?}", config.node.data_dir))?;
    let path = config.node.data_dir.join("nullifiers-db");
    let store = RocksDbNullifierStore::open(&path)
        .with_context(|| format!("Failed to open RocksDB at {:?}", path))?;
    info!("[runtime] Nullifier RocksDB at {:?}", path);
    Ok(Arc::new(store))
}

fn proof_signer(config: &BridgeConfig) -> Result<Arc<dyn ProofSigner>> {
    match config.signer_seed()? {
        Some(seed) => {
            let signer = Ed25519ProofSigner::from_seed(seed);
            info!(
                "[runtime] 🔑 Signing proofs with Ed25519 key {}",
                hex::encode(signer.public_key().as_bytes())
            );
            Ok(Arc::new(signer))
        }
        None => {
            warn!("[runtime] No signer seed configured, proofs carry digest signatures");
            Ok(Arc::new(DigestSigner))
        }
    }
}

/// A running bridge.
pub struct BridgeRuntime {
    handle: FinalizationHandle,
    events: Arc<InMemoryEventBus>,
    stakes: Arc<InMemoryStakeStore>,
    shutdown_tx: watch::Sender<bool>,
    tasks: Vec<(&'static str, JoinHandle<()>)>,
    status_addr: Option<SocketAddr>,
    shutdown_timeout: Duration,
}

impl BridgeRuntime {
    /// Validate `config`, wire every subsystem and spawn the tasks.
    pub async fn start<C, P>(config: BridgeConfig, adapters: BridgeAdapters<C, P>) -> Result<Self>
    where
        C: ParentChainClient + 'static,
        P: TransactionPool + 'static,
    {
        config.validate().context("Invalid configuration")?;

        info!("===========================================");
        info!("  Merge-Mining Bridge v{}", env!("CARGO_PKG_VERSION"));
        info!("===========================================");

        let events = Arc::new(InMemoryEventBus::new());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let verifier = DifficultyVerifier::from_config(config.pow.clone())
            .context("Failed to build PoW verifier")?;
        let timing = TimingAnomalyDetector::new(
            Arc::new(InMemoryTimingStore::new()),
            config.timing.clone(),
        )
        .context("Failed to build timing detector")?;
        let stakes = Arc::new(InMemoryStakeStore::with_stakes(config.validators.clone()));
        info!("[runtime] {} validator stakes loaded", config.validators.len());
        let reorg = ReorgGuard::new(stakes.clone(), config.reorg.clone())
        .context("Failed to build reorg guard")?;
        let registry = NullifierRegistry::new(adapters.nullifiers, config.nullifier.clone());
        let fanout = SubmissionFanout::new(
            adapters.da,
            adapters.settlement,
            config.submission.clone(),
            events.clone(),
        );

        let components = BridgeComponents {
            verifier: Arc::new(verifier),
            timing: Arc::new(timing),
            reorg: Arc::new(reorg),
            registry: Arc::new(registry),
            proofs: ProofBuilder::new(proof_signer(&config)?),
            fanout: Arc::new(fanout),
            events: events.clone(),
        };

        let orchestrator = FinalizationOrchestrator::new(config.finalization.clone(), components);
        let handle = orchestrator.handle();
        let ((child_tx, child_rx), (parent_tx, parent_rx)) = orchestrator.channels();

        let mut tasks = Vec::new();

        // Bind before spawning anything so a busy port fails startup cleanly.
        let mut status_addr = None;
        if let Some(addr) = config.node.status_addr {
            let listener = TcpListener::bind(addr)
                .await
                .with_context(|| format!("Failed to bind status endpoint on {addr}"))?;
            status_addr = Some(listener.local_addr()?);
            let state = status::StatusState {
                handle: handle.clone(),
                bus: events.clone(),
            };
            let status_shutdown = shutdown_rx.clone();
            tasks.push((
                "status",
                tokio::spawn(async move {
                    if let Err(e) = status::serve(listener, state, status_shutdown).await {
                        error!("[runtime] Status endpoint failed: {}", e);
                    }
                }),
            ));
        }

        tasks.push((
            "orchestrator",
            tokio::spawn(orchestrator.run(child_rx, parent_rx, shutdown_rx.clone())),
        ));

        let poller = ParentChainPoller::new(adapters.parent, config.parent.clone(), events.clone());
        tasks.push((
            "parent-poller",
            tokio::spawn(poller.run(parent_tx, shutdown_rx.clone())),
        ));

        let producer = ChildBlockProducer::new(adapters.pool, config.child.clone());
        tasks.push((
            "child-producer",
            tokio::spawn(producer.run(child_tx, shutdown_rx.clone())),
        ));

        tasks.push((
            "event-log",
            tokio::spawn(log_warnings(
                events.subscribe(EventFilter::warnings()),
                shutdown_rx,
            )),
        ));

        info!("[runtime] All subsystems started");
        Ok(Self {
            handle,
            events,
            stakes,
            shutdown_tx,
            tasks,
            status_addr,
            shutdown_timeout: config.finalization.shutdown_grace() + SHUTDOWN_SLACK,
        })
    }

    /// Status and operator controls.
    pub fn handle(&self) -> FinalizationHandle {
        self.handle.clone()
    }

    /// Event bus shared by every subsystem.
    pub fn events(&self) -> Arc<InMemoryEventBus> {
        self.events.clone()
    }

    /// Current validator stakes, in id order.
    pub fn validator_stakes(&self) -> Result<Vec<ValidatorStake>> {
        self.stakes
            .all()
            .context("Failed to read validator stakes")
    }

    /// Bound status address, if the endpoint is enabled.
    pub fn status_addr(&self) -> Option<SocketAddr> {
        self.status_addr
    }

    /// Signal shutdown and wait for every task.
    pub async fn shutdown(self) {
        info!("[runtime] Initiating graceful shutdown...");
        self.shutdown_tx.send_replace(true);

        for (name, task) in self.tasks {
            match tokio::time::timeout(self.shutdown_timeout, task).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!("[runtime] Task {} panicked: {}", name, e),
                Err(_) => warn!("[runtime] Task {} did not stop in time", name),
            }
        }
        let stats = self.events.stats();
        info!(
            "[runtime] Shutdown complete ({} events, {} warnings, {} lagged)",
            stats.published, stats.warnings, stats.lagged
        );
    }

    /// Run until Ctrl+C, then shut down.
    pub async fn run_until_ctrl_c(self) -> Result<()> {
        info!("[runtime] Bridge is running. Press Ctrl+C to stop.");
        tokio::signal::ctrl_c()
            .await
            .context("Failed to listen for Ctrl+C")?;
        self.shutdown().await;
        Ok(())
    }
}

async fn log_warnings(mut events: Subscription, mut shutdown: watch::Receiver<bool>) {
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(event) => warn!(
                    "[runtime] ⚠️ subsystem {} raised {:?}",
                    event.source_subsystem(),
                    event
                ),
                None => return,
            },
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    return;
                }
            }
        }
    }
}
