//! Parent chain polling service.

use std::future::Future;
use std::sync::Arc;

use shared_bus::{BridgeEvent, EventPublisher};
use shared_types::{ParentBlockRef, ReorgEvent, ReorgProof};
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::config::ParentChainConfig;
use crate::domain::{ParentChainEvent, RecentBlocks};
use crate::error::{ParentChainError, ParentChainResult};
use crate::ports::ParentChainClient;

/// Polls the parent chain and turns its progress into [`ParentChainEvent`]s.
pub struct ParentChainPoller<C: ParentChainClient> {
    client: Arc<C>,
    config: ParentChainConfig,
    publisher: Arc<dyn EventPublisher>,
    recent: RecentBlocks,
    last_seen: Option<u64>,
}

impl<C: ParentChainClient> ParentChainPoller<C> {
    /// Create a poller that starts from the current tip on its first poll.
    pub fn new(client: Arc<C>, config: ParentChainConfig, publisher: Arc<dyn EventPublisher>) -> Self {
        let recent = RecentBlocks::new(config.reorg_window);
        Self {
            client,
            config,
            publisher,
            recent,
            last_seen: None,
        }
    }

    /// Start from an explicit height; blocks above it are yielded.
    pub fn with_start_height(mut self, height: u64) -> Self {
        self.last_seen = Some(height);
        self
    }

    /// Highest height handed out so far.
    pub fn last_seen_height(&self) -> Option<u64> {
        self.last_seen
    }

    /// Next block above `last_seen_height`, or `None` if the tip has not moved.
    ///
    /// Errors are returned as errors after retries run out. They are never
    /// folded into `None`.
    pub async fn poll_for_new_block(
        &self,
        last_seen_height: u64,
    ) -> ParentChainResult<Option<ParentBlockRef>> {
        let info = self
            .with_retry("getinfo", || self.client.get_chain_info())
            .await?;

        if info.height <= last_seen_height {
            return Ok(None);
        }

        let next = last_seen_height + 1;
        let block = self
            .with_retry("getblock", || self.client.get_block(next))
            .await?;
        Ok(Some(block))
    }

    /// One poll cycle: reorg check, then every new height up to the catch-up limit.
    pub async fn poll(&mut self) -> ParentChainResult<Vec<ParentChainEvent>> {
        let info = self
            .with_retry("getinfo", || self.client.get_chain_info())
            .await?;

        let Some(last_seen) = self.last_seen else {
            let tip = self.fetch_block(info.height).await?;
            self.recent.record(tip.height, tip.hash);
            self.last_seen = Some(tip.height);
            info!("[mb-01] 🔌 Parent chain at height {}, waiting for next block", tip.height);
            return Ok(Vec::new());
        };

        // Work on copies: nothing is committed unless every fetch succeeds,
        // so a failed poll is replayed in full on the next tick.
        let mut recent = self.recent.clone();
        let mut cursor = last_seen;
        let mut events = Vec::new();

        if let Some(reorg) = self.detect_reorg(info.height).await? {
            cursor = reorg.proof.fork_height;
            recent.truncate_above(cursor);
            events.push(ParentChainEvent::Reorg(reorg));
        }

        let end = info.height.min(cursor.saturating_add(self.config.max_catch_up));
        if info.height > end {
            debug!(
                "[mb-01] Catch-up limited to {} blocks ({} behind)",
                self.config.max_catch_up,
                info.height - cursor
            );
        }

        for height in cursor + 1..=end {
            let block = self.fetch_block(height).await?;
            info!(
                "[mb-01] 🔥 New parent block {} ({})",
                height,
                shared_types::short_hex(&block.hash)
            );
            recent.record(block.height, block.hash);
            cursor = height;
            events.push(ParentChainEvent::NewBlock(block));
        }

        self.recent = recent;
        self.last_seen = Some(cursor);
        Ok(events)
    }

    async fn detect_reorg(&self, tip_height: u64) -> ParentChainResult<Option<ReorgEvent>> {
        let Some((seen_height, seen_hash)) = self.recent.tip() else {
            return Ok(None);
        };

        let check_height = seen_height.min(tip_height);
        let current = self.fetch_block(check_height).await?;
        let recorded = self.recent.hash_at(check_height);

        if recorded == Some(current.hash) {
            if check_height == seen_height {
                return Ok(None);
            }
            // Chain got shorter but agrees up to its new tip.
            return Ok(Some(self.reorg_event(seen_height, seen_hash, check_height, current.hash)));
        }

        let mut fork_height = None;
        for height in self
            .recent
            .heights_descending()
            .into_iter()
            .filter(|h| *h < check_height)
        {
            let block = self.fetch_block(height).await?;
            if self.recent.hash_at(height) == Some(block.hash) {
                fork_height = Some(height);
                break;
            }
        }

        let fork_height = match fork_height {
            Some(h) => h,
            // Fork is older than anything we remember.
            None => seen_height.saturating_sub(self.recent.capacity() as u64 + 1),
        };

        Ok(Some(self.reorg_event(seen_height, seen_hash, fork_height, current.hash)))
    }

    fn reorg_event(
        &self,
        seen_height: u64,
        seen_hash: shared_types::Hash,
        fork_height: u64,
        new_tip: shared_types::Hash,
    ) -> ReorgEvent {
        let depth = seen_height - fork_height;
        warn!(
            "[mb-01] ⚠️ Parent reorg detected: depth {} (fork at {})",
            depth, fork_height
        );
        ReorgEvent {
            depth,
            proof: ReorgProof {
                old_tip: seen_hash,
                new_tip,
                fork_height,
                implicated: Vec::new(),
            },
        }
    }

    async fn fetch_block(&self, height: u64) -> ParentChainResult<ParentBlockRef> {
        self.with_retry("getblock", || self.client.get_block(height))
            .await
    }

    async fn with_retry<T, F, Fut>(&self, what: &str, mut op: F) -> ParentChainResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ParentChainResult<T>>,
    {
        let attempts = self.config.retry.max_attempts.max(1);
        let mut last: Option<ParentChainError> = None;

        for attempt in 1..=attempts {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_transient() => return Err(e),
                Err(e) => {
                    warn!("[mb-01] {} failed (attempt {}/{}): {}", what, attempt, attempts, e);
                    last = Some(e);
                    if attempt < attempts {
                        tokio::time::sleep(self.config.retry.delay_for(attempt)).await;
                    }
                }
            }
        }

        Err(ParentChainError::RetriesExhausted {
            attempts,
            last: last.map(|e| e.to_string()).unwrap_or_default(),
        })
    }

    /// Poll on the configured interval until shutdown or until the receiver is gone.
    pub async fn run(
        mut self,
        events: mpsc::Sender<ParentChainEvent>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut ticker = tokio::time::interval(self.config.poll_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            "[mb-01] 👁️ Parent chain polling every {}s",
            self.config.poll_interval_secs
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.poll().await {
                        Ok(batch) => {
                            for event in batch {
                                if events.send(event).await.is_err() {
                                    info!("[mb-01] Orchestrator gone, stopping poller");
                                    return;
                                }
                            }
                        }
                        Err(e) => {
                            error!("[mb-01] ❌ Parent chain poll failed: {}", e);
                            self.publisher
                                .publish(BridgeEvent::ParentChainUnavailable {
                                    last_seen_height: self.last_seen.unwrap_or(0),
                                    error: e.to_string(),
                                })
                                .await;
                        }
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("[mb-01] Parent chain poller shutting down");
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
    use crate::adapters::MockParentChainClient;
    use crate::config::RetryPolicy;
    use shared_bus::NoopEventPublisher;

    fn poller(client: Arc<MockParentChainClient>) -> ParentChainPoller<MockParentChainClient> {
        let config = ParentChainConfig {
            retry: RetryPolicy {
                base_delay_ms: 10,
                max_delay_ms: 50,
                max_attempts: 3,
            },
            reorg_window: 20,
            max_catch_up: 5,
            ..Default::default()
        };
        ParentChainPoller::new(client, config, Arc::new(NoopEventPublisher::default()))
    }

    fn heights(events: &[ParentChainEvent]) -> Vec<u64> {
        events
            .iter()
            .filter_map(|e| match e {
                ParentChainEvent::NewBlock(b) => Some(b.height),
                ParentChainEvent::Reorg(_) => None,
            })
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_for_new_block_none_when_tip_unchanged() {
        let client = Arc::new(MockParentChainClient::with_chain(1, 10, 480));
        let poller = poller(client);
        assert_eq!(poller.poll_for_new_block(10).await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_for_new_block_returns_next_height() {
        let client = Arc::new(MockParentChainClient::with_chain(1, 12, 480));
        let poller = poller(client);
        let block = poller.poll_for_new_block(10).await.unwrap().unwrap();
        assert_eq!(block.height, 11);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failures_are_retried() {
        let client = Arc::new(MockParentChainClient::with_chain(1, 11, 480));
        client.fail_next(2);
        let poller = poller(client.clone());
        let block = poller.poll_for_new_block(10).await.unwrap();
        assert_eq!(block.map(|b| b.height), Some(11));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_is_not_reported_as_no_block() {
        let client = Arc::new(MockParentChainClient::with_chain(1, 10, 480));
        client.set_always_fail(true);
        let poller = poller(client.clone());
        let result = poller.poll_for_new_block(10).await;
        assert!(matches!(
            result,
            Err(ParentChainError::RetriesExhausted { attempts: 3, .. })
        ));
        assert_eq!(client.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_poll_anchors_at_tip() {
        let client = Arc::new(MockParentChainClient::with_chain(1, 10, 480));
        let mut poller = poller(client.clone());
        assert!(poller.poll().await.unwrap().is_empty());
        assert_eq!(poller.last_seen_height(), Some(10));

        client.push_block(MockParentChainClient::make_block(11, 1_700_005_280, 0));
        let events = poller.poll().await.unwrap();
        assert_eq!(heights(&events), vec![11]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_catch_up_yields_every_height_in_order() {
        let client = Arc::new(MockParentChainClient::with_chain(1, 20, 480));
        let mut poller = poller(client).with_start_height(12);

        let first = poller.poll().await.unwrap();
        assert_eq!(heights(&first), vec![13, 14, 15, 16, 17]);

        let second = poller.poll().await.unwrap();
        assert_eq!(heights(&second), vec![18, 19, 20]);
        assert_eq!(poller.last_seen_height(), Some(20));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reorg_is_detected_with_depth() {
        let client = Arc::new(MockParentChainClient::with_chain(1, 10, 480));
        let mut poller = poller(client.clone()).with_start_height(0);
        let events = poller.poll().await.unwrap();
        assert_eq!(heights(&events), vec![1, 2, 3, 4, 5]);
        poller.poll().await.unwrap();
        assert_eq!(poller.last_seen_height(), Some(10));

        client.fork(7, 11, 1);
        let events = poller.poll().await.unwrap();

        let reorg = events
            .iter()
            .find_map(|e| match e {
                ParentChainEvent::Reorg(r) => Some(r.clone()),
                ParentChainEvent::NewBlock(_) => None,
            })
            .expect("reorg event");
        assert_eq!(reorg.depth, 3);
        assert_eq!(reorg.proof.fork_height, 7);
        assert_eq!(heights(&events), vec![8, 9, 10, 11]);
    }

    /// Serves `inner` but fails `get_block(height)` after `passes` successful fetches
    /// of that height, until `healed` is set.
    struct FlakyAt {
        inner: MockParentChainClient,
        height: u64,
        passes: std::sync::atomic::AtomicU32,
        healed: std::sync::atomic::AtomicBool,
    }

    #[async_trait::async_trait]
    impl ParentChainClient for FlakyAt {
        async fn get_chain_info(&self) -> ParentChainResult<shared_types::ChainInfo> {
            self.inner.get_chain_info().await
        }
        async fn get_block(&self, height: u64) -> ParentChainResult<ParentBlockRef> {
            use std::sync::atomic::Ordering;
            if height == self.height && !self.healed.load(Ordering::SeqCst) {
                let passes = self.passes.load(Ordering::SeqCst);
                if passes == 0 {
                    return Err(ParentChainError::Transport("connection reset".into()));
                }
                self.passes.store(passes - 1, Ordering::SeqCst);
            }
            self.inner.get_block(height).await
        }
    }

    fn reorgs(events: &[ParentChainEvent]) -> Vec<ReorgEvent> {
        events
            .iter()
            .filter_map(|e| match e {
                ParentChainEvent::Reorg(r) => Some(r.clone()),
                ParentChainEvent::NewBlock(_) => None,
            })
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_poll_keeps_reorg_for_next_poll() {
        let inner = MockParentChainClient::with_chain(1, 10, 480);
        inner.fork(7, 11, 1);
        let client = Arc::new(FlakyAt {
            inner,
            height: 8,
            // The reorg walk-back reads height 8 once, the catch-up read fails.
            passes: std::sync::atomic::AtomicU32::new(1),
            healed: std::sync::atomic::AtomicBool::new(false),
        });

        let mut poller = ParentChainPoller::new(
            client.clone(),
            ParentChainConfig {
                retry: RetryPolicy {
                    base_delay_ms: 10,
                    max_delay_ms: 50,
                    max_attempts: 3,
                },
                reorg_window: 20,
                max_catch_up: 5,
                ..Default::default()
            },
            Arc::new(NoopEventPublisher::default()),
        );
        // Seed the window with the pre-fork branch 1..=10.
        let original = MockParentChainClient::with_chain(1, 10, 480);
        for h in 1..=10 {
            let block = original.get_block(h).await.unwrap();
            poller.recent.record(block.height, block.hash);
        }
        poller.last_seen = Some(10);

        let first = poller.poll().await;
        assert!(matches!(first, Err(ParentChainError::RetriesExhausted { .. })));
        assert_eq!(poller.last_seen_height(), Some(10));

        client.healed.store(true, std::sync::atomic::Ordering::SeqCst);
        let second = poller.poll().await.unwrap();
        let found = reorgs(&second);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].depth, 3);
        assert_eq!(found[0].proof.fork_height, 7);
        assert_eq!(heights(&second), vec![8, 9, 10, 11]);
        assert_eq!(poller.last_seen_height(), Some(11));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_catch_up_is_replayed_from_the_same_height() {
        let inner = MockParentChainClient::with_chain(1, 20, 480);
        let client = Arc::new(FlakyAt {
            inner,
            height: 15,
            passes: std::sync::atomic::AtomicU32::new(0),
            healed: std::sync::atomic::AtomicBool::new(false),
        });
        let mut poller = ParentChainPoller::new(
            client.clone(),
            ParentChainConfig {
                retry: RetryPolicy {
                    base_delay_ms: 10,
                    max_delay_ms: 50,
                    max_attempts: 2,
                },
                max_catch_up: 5,
                ..Default::default()
            },
            Arc::new(NoopEventPublisher::default()),
        )
        .with_start_height(12);

        assert!(poller.poll().await.is_err());
        assert_eq!(poller.last_seen_height(), Some(12));

        client.healed.store(true, std::sync::atomic::Ordering::SeqCst);
        let events = poller.poll().await.unwrap();
        assert_eq!(heights(&events), vec![13, 14, 15, 16, 17]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_response_is_not_retried() {
        struct Broken;

        #[async_trait::async_trait]
        impl ParentChainClient for Broken {
            async fn get_chain_info(&self) -> ParentChainResult<shared_types::ChainInfo> {
                Err(ParentChainError::MalformedResponse("height".into()))
            }
            async fn get_block(&self, height: u64) -> ParentChainResult<ParentBlockRef> {
                Err(ParentChainError::BlockNotFound(height))
            }
        }

        let poller = ParentChainPoller::new(
            Arc::new(Broken),
            ParentChainConfig::default(),
            Arc::new(NoopEventPublisher::default()),
        );
        assert!(matches!(
            poller.poll_for_new_block(0).await,
            Err(ParentChainError::MalformedResponse(_))
        ));
    }
}
