//! In-memory parent chain for tests and local development.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use shared_crypto::sha256_concat;
use shared_types::{ChainInfo, Hash, ParentBlockRef, ParentHeader};

use crate::config::DEFAULT_PRIMARY_TARGET;
use crate::error::{ParentChainError, ParentChainResult};
use crate::ports::ParentChainClient;

/// Parent chain held in memory. Can be told to fail and to fork.
#[derive(Default)]
pub struct MockParentChainClient {
    blocks: RwLock<BTreeMap<u64, ParentBlockRef>>,
    fail_next: AtomicU32,
    always_fail: RwLock<bool>,
    calls: AtomicU64,
}

impl MockParentChainClient {
    /// Empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Chain with blocks `from..=to`, spaced `interval` seconds apart.
    pub fn with_chain(from: u64, to: u64, interval: u64) -> Self {
        let client = Self::new();
        for height in from..=to {
            client.push_block(Self::make_block(height, 1_700_000_000 + height * interval, 0));
        }
        client
    }

    /// Deterministic block at `height` on branch `branch`.
    pub fn make_block(height: u64, timestamp: u64, branch: u8) -> ParentBlockRef {
        let hash = Self::block_hash(height, branch);
        ParentBlockRef {
            hash,
            height,
            timestamp,
            primary_difficulty: DEFAULT_PRIMARY_TARGET,
            auxiliary_difficulty: None,
            header: ParentHeader {
                major_version: 1,
                minor_version: 0,
                previous_hash: Self::block_hash(height.saturating_sub(1), branch),
                nonce: height as u32,
                aux_block_hash: None,
                external_commitment: None,
            },
        }
    }

    fn block_hash(height: u64, branch: u8) -> Hash {
        sha256_concat(&[&height.to_le_bytes(), &[branch]])
    }

    /// Add or replace a block.
    pub fn push_block(&self, block: ParentBlockRef) {
        self.blocks.write().insert(block.height, block);
    }

    /// Replace every block above `fork_height` up to `new_tip` with a new branch.
    pub fn fork(&self, fork_height: u64, new_tip: u64, branch: u8) {
        let mut blocks = self.blocks.write();
        blocks.retain(|h, _| *h <= fork_height);
        for height in fork_height + 1..=new_tip {
            blocks.insert(
                height,
                Self::make_block(height, 1_700_000_000 + height * 480, branch),
            );
        }
    }

    /// Fail the next `count` calls with a transport error.
    pub fn fail_next(&self, count: u32) {
        self.fail_next.store(count, Ordering::SeqCst);
    }

    /// Fail every call until turned off.
    pub fn set_always_fail(&self, fail: bool) {
        *self.always_fail.write() = fail;
    }

    /// Number of port calls served or failed.
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    fn check_failure(&self) -> ParentChainResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if *self.always_fail.read() {
            return Err(ParentChainError::Transport("mock: node unreachable".into()));
        }
        let remaining = self.fail_next.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_next.store(remaining - 1, Ordering::SeqCst);
            return Err(ParentChainError::Transport("mock: connection reset".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl ParentChainClient for MockParentChainClient {
    async fn get_chain_info(&self) -> ParentChainResult<ChainInfo> {
        self.check_failure()?;
        let blocks = self.blocks.read();
        let tip = blocks.keys().next_back().copied().unwrap_or(0);
        Ok(ChainInfo {
            height: tip,
            difficulty: DEFAULT_PRIMARY_TARGET,
        })
    }

    async fn get_block(&self, height: u64) -> ParentChainResult<ParentBlockRef> {
        self.check_failure()?;
        self.blocks
            .read()
            .get(&height)
            .cloned()
            .ok_or(ParentChainError::BlockNotFound(height))
    }
}
