//! # Outbound Ports
//!
//! The parent chain node, treated as untrusted network I/O.

use async_trait::async_trait;
use shared_types::{ChainInfo, ParentBlockRef};

use crate::error::ParentChainResult;

/// Parent chain node - outbound port.
#[async_trait]
pub trait ParentChainClient: Send + Sync {
    /// Current tip height and difficulty.
    async fn get_chain_info(&self) -> ParentChainResult<ChainInfo>;

    /// Block at `height`.
    async fn get_block(&self, height: u64) -> ParentChainResult<ParentBlockRef>;
}
