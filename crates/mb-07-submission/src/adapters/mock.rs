//! In-memory sinks with failure injection for tests and dry runs.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use shared_crypto::sha256;
use shared_types::hash_hex;

use crate::domain::{DaReceipt, SettlementReceipt, SettlementRecord};
use crate::error::{SubmissionError, SubmissionResult};
use crate::ports::{DataAvailabilitySink, SettlementSink};

/// Failure switches shared by both mocks.
#[derive(Debug, Default)]
struct Faults {
    fail_next: AtomicU32,
    always_fail: AtomicBool,
    hang: AtomicBool,
    calls: AtomicU32,
}

impl Faults {
    async fn enter(&self, sink: &str) -> SubmissionResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.hang.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        if self.always_fail.load(Ordering::SeqCst) {
            return Err(SubmissionError::Transport(format!("{sink} unavailable")));
        }
        let pending = self.fail_next.load(Ordering::SeqCst);
        if pending > 0 {
            self.fail_next.fetch_sub(1, Ordering::SeqCst);
            return Err(SubmissionError::Transport(format!("{sink} injected failure")));
        }
        Ok(())
    }
}

/// DA layer held in memory.
#[derive(Debug)]
pub struct MockDataAvailabilitySink {
    blobs: RwLock<HashMap<(u64, String), Vec<u8>>>,
    next_height: AtomicU64,
    faults: Faults,
}

impl Default for MockDataAvailabilitySink {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDataAvailabilitySink {
    /// Empty DA layer whose first blob lands at height 1.
    pub fn new() -> Self {
        Self {
            blobs: RwLock::new(HashMap::new()),
            next_height: AtomicU64::new(1),
            faults: Faults::default(),
        }
    }

    /// Fail the next `n` calls with a transport error.
    pub fn fail_next(&self, n: u32) {
        self.faults.fail_next.store(n, Ordering::SeqCst);
    }

    /// Fail every call until switched off.
    pub fn set_always_fail(&self, fail: bool) {
        self.faults.always_fail.store(fail, Ordering::SeqCst);
    }

    /// Never answer until switched off.
    pub fn set_hang(&self, hang: bool) {
        self.faults.hang.store(hang, Ordering::SeqCst);
    }

    /// Calls received, including failed ones.
    pub fn calls(&self) -> u32 {
        self.faults.calls.load(Ordering::SeqCst)
    }

    /// Blobs stored.
    pub fn blob_count(&self) -> usize {
        self.blobs.read().len()
    }

    /// Overwrite the blob at `height`, simulating a DA layer that lost or altered it.
    pub fn corrupt(&self, height: u64, namespace: &str) {
        if let Some(blob) = self.blobs.write().get_mut(&(height, namespace.to_string())) {
            blob.push(0xff);
        }
    }
}

#[async_trait]
impl DataAvailabilitySink for MockDataAvailabilitySink {
    async fn submit_blob(&self, namespace: &str, data: &[u8]) -> SubmissionResult<DaReceipt> {
        self.faults.enter("da").await?;
        let height = self.next_height.fetch_add(1, Ordering::SeqCst);
        self.blobs
            .write()
            .insert((height, namespace.to_string()), data.to_vec());
        Ok(DaReceipt {
            height,
            commitment: hash_hex(&sha256(data)),
        })
    }

    async fn get_blob(&self, height: u64, namespace: &str) -> SubmissionResult<Vec<u8>> {
        self.blobs
            .read()
            .get(&(height, namespace.to_string()))
            .cloned()
            .ok_or(SubmissionError::BlobNotFound(height))
    }
}

/// Settlement layer held in memory.
#[derive(Debug, Default)]
pub struct MockSettlementSink {
    records: RwLock<Vec<SettlementRecord>>,
    faults: Faults,
}

impl MockSettlementSink {
    /// Empty settlement layer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `n` calls with a transport error.
    pub fn fail_next(&self, n: u32) {
        self.faults.fail_next.store(n, Ordering::SeqCst);
    }

    /// Fail every call until switched off.
    pub fn set_always_fail(&self, fail: bool) {
        self.faults.always_fail.store(fail, Ordering::SeqCst);
    }

    /// Never answer until switched off.
    pub fn set_hang(&self, hang: bool) {
        self.faults.hang.store(hang, Ordering::SeqCst);
    }

    /// Calls received, including failed ones.
    pub fn calls(&self) -> u32 {
        self.faults.calls.load(Ordering::SeqCst)
    }

    /// Records accepted so far.
    pub fn records(&self) -> Vec<SettlementRecord> {
        self.records.read().clone()
    }
}

#[async_trait]
impl SettlementSink for MockSettlementSink {
    async fn submit(&self, record: SettlementRecord) -> SubmissionResult<SettlementReceipt> {
        self.faults.enter("settlement").await?;
        let mut records = self.records.write();
        records.push(record);
        Ok(SettlementReceipt {
            tx_id: format!("0xmock{:04}", records.len()),
            settled_height: Some(records.len() as u64),
        })
    }
}
