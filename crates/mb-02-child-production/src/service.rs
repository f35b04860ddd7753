//! Child block producer service.

use std::collections::HashSet;
use std::sync::Arc;

use shared_types::{ChildBlock, Hash, SystemTimeSource, TimeSource, ZERO_HASH};
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::config::ChildProductionConfig;
use crate::domain::assemble_block;
use crate::error::{ProductionError, ProductionResult};
use crate::ports::TransactionPool;

/// Produces child blocks on a fixed cadence.
pub struct ChildBlockProducer<P: TransactionPool> {
    pool: Arc<P>,
    config: ChildProductionConfig,
    clock: Arc<dyn TimeSource>,
    next_height: u64,
    previous_hash: Hash,
    /// Included in a handed-off block but not yet removed from the pool.
    in_flight: HashSet<Hash>,
    blocks_produced: u64,
}

impl<P: TransactionPool> ChildBlockProducer<P> {
    /// Create a producer starting at `config.start_height` on top of the zero hash.
    pub fn new(pool: Arc<P>, config: ChildProductionConfig) -> Self {
        let next_height = config.start_height;
        Self {
            pool,
            config,
            clock: Arc::new(SystemTimeSource),
            next_height,
            previous_hash: ZERO_HASH,
            in_flight: HashSet::new(),
            blocks_produced: 0,
        }
    }

    /// Use a different clock.
    pub fn with_clock(mut self, clock: Arc<dyn TimeSource>) -> Self {
        self.clock = clock;
        self
    }

    /// Continue an existing chain.
    pub fn resume_from(mut self, last_height: u64, last_hash: Hash) -> Self {
        self.next_height = last_height + 1;
        self.previous_hash = last_hash;
        self
    }

    /// Height the next block will get.
    pub fn next_height(&self) -> u64 {
        self.next_height
    }

    /// Blocks produced so far.
    pub fn blocks_produced(&self) -> u64 {
        self.blocks_produced
    }

    /// Assemble the next block from the pool.
    ///
    /// A pool failure is logged and yields an empty block; nothing is lost
    /// because the transactions stay in the pool.
    pub async fn produce_block(&mut self) -> ChildBlock {
        self.flush_in_flight().await;

        let limit = self.config.max_transactions_per_block;
        let candidates = match self
            .pool
            .pending_transactions(limit + self.in_flight.len())
            .await
        {
            Ok(txs) => txs
                .into_iter()
                .filter(|tx| !self.in_flight.contains(&tx.hash))
                .take(limit)
                .collect(),
            Err(e) => {
                warn!("[mb-02] ⚠️ Pool read failed, producing empty block: {}", e);
                Vec::new()
            }
        };

        let block = assemble_block(
            self.next_height,
            self.clock.now(),
            self.previous_hash,
            candidates,
            self.config.gas_limit,
        );

        self.previous_hash = block.hash();
        self.next_height += 1;
        self.blocks_produced += 1;

        debug!(
            "[mb-02] Assembled child block {} with {} txs ({} gas)",
            block.height,
            block.transactions.len(),
            block.gas_used
        );
        block
    }

    /// Record that `block` reached the orchestrator; drop its transactions from the pool.
    pub async fn confirm_handoff(&mut self, block: &ChildBlock) {
        self.in_flight
            .extend(block.transactions.iter().map(|tx| tx.hash));
        self.flush_in_flight().await;
    }

    async fn flush_in_flight(&mut self) {
        if self.in_flight.is_empty() {
            return;
        }
        let hashes: Vec<Hash> = self.in_flight.iter().copied().collect();
        match self.pool.remove_included(&hashes).await {
            Ok(()) => self.in_flight.clear(),
            Err(e) => warn!(
                "[mb-02] Could not remove {} included txs yet: {}",
                hashes.len(),
                e
            ),
        }
    }

    /// Produce one block and hand it off.
    pub async fn tick(&mut self, sender: &mpsc::Sender<ChildBlock>) -> ProductionResult<u64> {
        let block = self.produce_block().await;
        let height = block.height;
        let tx_count = block.transactions.len();
        sender
            .send(block.clone())
            .await
            .map_err(|_| ProductionError::ChannelClosed)?;
        self.confirm_handoff(&block).await;
        info!("[mb-02] ❄️ Produced child block {} ({} txs)", height, tx_count);
        Ok(height)
    }

    /// Produce on the configured cadence until shutdown or until the receiver is gone.
    pub async fn run(mut self, sender: mpsc::Sender<ChildBlock>, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.config.block_time());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            "[mb-02] 🧊 Child block production every {}s from height {}",
            self.config.block_time_secs, self.next_height
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.tick(&sender).await {
                        info!("[mb-02] Stopping producer: {}", e);
                        return;
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("[mb-02] Child block producer shutting down");
                        break;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryTransactionPool;
    use shared_types::{ManualTimeSource, Transaction};
    use std::time::Duration;

    fn producer(pool: Arc<InMemoryTransactionPool>) -> ChildBlockProducer<InMemoryTransactionPool> {
        ChildBlockProducer::new(pool, ChildProductionConfig::default())
            .with_clock(Arc::new(ManualTimeSource::new(1_700_000_000)))
    }

    fn tx(nonce: u64) -> Transaction {
        Transaction::new("alice", "bob", 1, nonce, vec![], None)
    }

    #[tokio::test]
    async fn test_blocks_chain_by_hash_and_height() {
        let pool = Arc::new(InMemoryTransactionPool::new());
        let mut producer = producer(pool);

        let first = producer.produce_block().await;
        let second = producer.produce_block().await;

        assert_eq!(first.height, 1);
        assert_eq!(second.height, 2);
        assert_eq!(first.previous_hash, ZERO_HASH);
        assert_eq!(second.previous_hash, first.hash());
        assert_eq!(producer.blocks_produced(), 2);
    }

    #[tokio::test]
    async fn test_pool_failure_yields_empty_block() {
        let pool = Arc::new(InMemoryTransactionPool::new());
        pool.submit(tx(0));
        pool.set_unavailable(true);
        let mut producer = producer(pool.clone());

        let block = producer.produce_block().await;
        assert!(block.transactions.is_empty());

        pool.set_unavailable(false);
        assert_eq!(pool.len(), 1);
        let block = producer.produce_block().await;
        assert_eq!(block.transactions.len(), 1);
    }

    #[tokio::test]
    async fn test_handoff_removes_transactions() {
        let pool = Arc::new(InMemoryTransactionPool::new());
        pool.submit(tx(0));
        pool.submit(tx(1));
        let mut producer = producer(pool.clone());
        let (sender, mut receiver) = mpsc::channel(4);

        producer.tick(&sender).await.unwrap();

        let block = receiver.recv().await.unwrap();
        assert_eq!(block.transactions.len(), 2);
        assert!(pool.is_empty());
    }

    #[tokio::test]
    async fn test_failed_removal_does_not_duplicate() {
        let pool = Arc::new(InMemoryTransactionPool::new());
        pool.submit(tx(0));
        let mut producer = producer(pool.clone());

        let block = producer.produce_block().await;
        pool.set_unavailable(true);
        producer.confirm_handoff(&block).await;
        pool.set_unavailable(false);

        let next = producer.produce_block().await;
        assert!(next.transactions.is_empty());
        assert!(pool.is_empty());
    }

    #[tokio::test]
    async fn test_closed_channel_stops_tick() {
        let pool = Arc::new(InMemoryTransactionPool::new());
        let mut producer = producer(pool);
        let (sender, receiver) = mpsc::channel(1);
        drop(receiver);
        assert_eq!(producer.tick(&sender).await, Err(ProductionError::ChannelClosed));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_produces_until_shutdown() {
        let pool = Arc::new(InMemoryTransactionPool::new());
        let producer = producer(pool);
        let (sender, mut receiver) = mpsc::channel(16);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(producer.run(sender, shutdown_rx));
        tokio::time::sleep(Duration::from_secs(17)).await;
        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();

        let mut heights = Vec::new();
        while let Ok(block) = receiver.try_recv() {
            heights.push(block.height);
        }
        assert_eq!(heights, vec![1, 2, 3]);
    }
}
