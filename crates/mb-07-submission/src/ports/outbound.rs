//! Driven ports

use async_trait::async_trait;
use shared_types::Hash;

use crate::domain::{DaBlob, DaReceipt, SettlementReceipt, SettlementRecord};
use crate::error::SubmissionResult;

/// Data-availability layer.
#[async_trait]
pub trait DataAvailabilitySink: Send + Sync {
    /// Publish `data` under `namespace`.
    async fn submit_blob(&self, namespace: &str, data: &[u8]) -> SubmissionResult<DaReceipt>;

    /// Read back the blob stored at `height` under `namespace`.
    async fn get_blob(&self, height: u64, namespace: &str) -> SubmissionResult<Vec<u8>>;

    /// Whether the blob at `height` hashes to `expected_hash`.
    async fn verify_inclusion(
        &self,
        height: u64,
        namespace: &str,
        expected_hash: &Hash,
    ) -> SubmissionResult<bool> {
        let blob = self.get_blob(height, namespace).await?;
        Ok(DaBlob::content_hash(&blob) == *expected_hash)
    }
}

/// Settlement layer.
#[async_trait]
pub trait SettlementSink: Send + Sync {
    /// Submit a batch summary for settlement.
    async fn submit(&self, record: SettlementRecord) -> SubmissionResult<SettlementReceipt>;
}
