//! Per-batch record of what each sink did.

use std::collections::VecDeque;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as};
use shared_bus::SinkKind;
use shared_types::{FinalityLevel, Hash, Timestamp};

/// How one sink handled one batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SinkOutcome {
    /// The sink accepted the batch.
    Delivered {
        /// Calls made, including the successful one.
        attempts: u32,
        /// Receipt reference (DA height or settlement tx id).
        reference: String,
    },
    /// Every attempt failed.
    Failed {
        /// Calls made.
        attempts: u32,
        /// Last error.
        error: String,
    },
}

impl SinkOutcome {
    /// Whether the sink accepted the batch.
    pub fn is_success(&self) -> bool {
        matches!(self, SinkOutcome::Delivered { .. })
    }

    /// Calls made.
    pub fn attempts(&self) -> u32 {
        match self {
            SinkOutcome::Delivered { attempts, .. } | SinkOutcome::Failed { attempts, .. } => {
                *attempts
            }
        }
    }

    /// Error text when failed.
    pub fn error(&self) -> Option<&str> {
        match self {
            SinkOutcome::Failed { error, .. } => Some(error),
            SinkOutcome::Delivered { .. } => None,
        }
    }
}

/// Submission result for one finalized batch.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    /// Parent height that finalized the batch.
    pub parent_height: u64,
    /// Parent hash that finalized the batch.
    #[serde_as(as = "Hex")]
    pub parent_hash: Hash,
    /// Data-availability outcome.
    pub da: SinkOutcome,
    /// Read-back check of the DA blob, when it ran.
    pub da_inclusion_verified: Option<bool>,
    /// Settlement outcome.
    pub settlement: SinkOutcome,
    /// Calls made across both sinks.
    pub attempts: u32,
    /// Highest level the batch reached.
    pub finality_level: FinalityLevel,
    /// When the fan-out finished.
    pub completed_at: Timestamp,
}

impl SubmissionRecord {
    /// Outcome for `sink`.
    pub fn outcome(&self, sink: SinkKind) -> &SinkOutcome {
        match sink {
            SinkKind::DataAvailability => &self.da,
            SinkKind::Settlement => &self.settlement,
        }
    }

    /// Sinks that failed.
    pub fn failed_sinks(&self) -> Vec<SinkKind> {
        [SinkKind::DataAvailability, SinkKind::Settlement]
            .into_iter()
            .filter(|s| !self.outcome(*s).is_success())
            .collect()
    }
}

/// Highest finality a batch reached given its sink outcomes.
///
/// A finalized batch is at least `Hard`: it is anchored to a verified parent block.
pub fn finality_for(da_confirmed: bool, settled: bool) -> FinalityLevel {
    if settled {
        FinalityLevel::SettlementFinalized
    } else if da_confirmed {
        FinalityLevel::DaConfirmed
    } else {
        FinalityLevel::Hard
    }
}

/// Bounded, newest-last log of submission records.
#[derive(Debug)]
pub struct SubmissionAuditLog {
    records: RwLock<VecDeque<SubmissionRecord>>,
    capacity: usize,
}

impl Default for SubmissionAuditLog {
    fn default() -> Self {
        Self::with_capacity(1024)
    }
}

impl SubmissionAuditLog {
    /// Log keeping the newest `capacity` records.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: RwLock::new(VecDeque::with_capacity(capacity.min(4096))),
            capacity: capacity.max(1),
        }
    }

    /// Append a record, evicting the oldest past capacity.
    pub fn record(&self, record: SubmissionRecord) {
        let mut records = self.records.write();
        if records.len() == self.capacity {
            records.pop_front();
        }
        records.push_back(record);
    }

    /// All retained records, oldest first.
    pub fn all(&self) -> Vec<SubmissionRecord> {
        self.records.read().iter().cloned().collect()
    }

    /// Most recent record.
    pub fn latest(&self) -> Option<SubmissionRecord> {
        self.records.read().back().cloned()
    }

    /// Record for the batch finalized at `parent_height`.
    pub fn for_parent(&self, parent_height: u64) -> Option<SubmissionRecord> {
        self.records
            .read()
            .iter()
            .rev()
            .find(|r| r.parent_height == parent_height)
            .cloned()
    }

    /// Records where `sink` failed.
    pub fn failures(&self, sink: SinkKind) -> Vec<SubmissionRecord> {
        self.records
            .read()
            .iter()
            .filter(|r| !r.outcome(sink).is_success())
            .cloned()
            .collect()
    }

    /// Retained record count.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// `true` when nothing is retained.
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}
