//! # Bridge Events
//!
//! Notifications published by the bridge subsystems.

use serde::{Deserialize, Serialize};
use shared_types::entities::{Hash, ReorgDecision};

/// Downstream sink a submission went to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SinkKind {
    /// Data-availability layer.
    DataAvailability,
    /// Settlement layer.
    Settlement,
}

impl std::fmt::Display for SinkKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SinkKind::DataAvailability => f.write_str("da"),
            SinkKind::Settlement => f.write_str("settlement"),
        }
    }
}

/// All events that can be published to the bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BridgeEvent {
    // =========================================================================
    // SUBSYSTEM 1: PARENT CHAIN
    // =========================================================================
    /// The parent chain could not be reached after exhausting retries.
    ParentChainUnavailable {
        /// Last seen parent height when polling failed.
        last_seen_height: u64,
        /// Rendered error.
        error: String,
    },

    // =========================================================================
    // SUBSYSTEM 2: CHILD PRODUCTION
    // =========================================================================
    /// A child block entered the pending buffer.
    ChildBlockBuffered {
        height: u64,
        block_hash: Hash,
        tx_count: usize,
        buffer_size: usize,
    },

    // =========================================================================
    // SUBSYSTEM 3: POW VERIFICATION
    // =========================================================================
    /// A parent block was discarded and will not be finalized against.
    ParentBlockRejected {
        parent_height: u64,
        parent_hash: Hash,
        reason: String,
    },

    // =========================================================================
    // SUBSYSTEMS 4-5: GUARDS
    // =========================================================================
    /// Parent block interval deviated from the expected cadence.
    TimingAnomaly {
        parent_height: u64,
        interval_secs: i64,
        score: f64,
    },

    /// A reorg claim was evaluated.
    ReorgEvaluated {
        depth: u64,
        decision: ReorgDecision,
        slashed: usize,
        removed: usize,
    },

    /// A nullifier claim was refused during commit.
    ClaimRejected {
        nullifier_id: Hash,
        tx_hash: Hash,
        reason: String,
    },

    // =========================================================================
    // SUBSYSTEM 7: SUBMISSION
    // =========================================================================
    /// One sink finished handling a finalized batch.
    SubmissionCompleted {
        parent_height: u64,
        sink: SinkKind,
        success: bool,
        attempts: u32,
        detail: String,
    },

    // =========================================================================
    // SUBSYSTEM 8: FINALIZATION
    // =========================================================================
    /// Buffered child blocks were bound to a parent block.
    BatchFinalized {
        parent_height: u64,
        parent_hash: Hash,
        child_count: usize,
        merkle_root: Hash,
    },

    /// The pipeline stopped accepting finalizations.
    EmergencyHalt { depth: u64, reason: String },

    /// An operator cleared the halt.
    HaltCleared,
}

impl BridgeEvent {
    /// Get the topic for this event.
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::ParentChainUnavailable { .. } => EventTopic::ParentChain,
            Self::ChildBlockBuffered { .. } => EventTopic::ChildProduction,
            Self::ParentBlockRejected { .. } => EventTopic::Verification,
            Self::TimingAnomaly { .. } | Self::ReorgEvaluated { .. } | Self::ClaimRejected { .. } => {
                EventTopic::Guards
            }
            Self::SubmissionCompleted { .. } => EventTopic::Submission,
            Self::BatchFinalized { .. } | Self::EmergencyHalt { .. } | Self::HaltCleared => {
                EventTopic::Finalization
            }
        }
    }

    /// Get the originating subsystem ID.
    #[must_use]
    pub fn source_subsystem(&self) -> u8 {
        match self {
            Self::ParentChainUnavailable { .. } => 1,
            Self::ChildBlockBuffered { .. } => 2,
            Self::ParentBlockRejected { .. } => 3,
            Self::TimingAnomaly { .. } | Self::ReorgEvaluated { .. } => 4,
            Self::ClaimRejected { .. } => 5,
            Self::SubmissionCompleted { .. } => 7,
            Self::BatchFinalized { .. } | Self::EmergencyHalt { .. } | Self::HaltCleared => 8,
        }
    }

    /// Whether an operator should look at this event.
    #[must_use]
    pub fn is_warning(&self) -> bool {
        match self {
            Self::ParentChainUnavailable { .. }
            | Self::ParentBlockRejected { .. }
            | Self::TimingAnomaly { .. }
            | Self::ClaimRejected { .. }
            | Self::EmergencyHalt { .. } => true,
            Self::ReorgEvaluated { decision, .. } => *decision != ReorgDecision::Accept,
            Self::SubmissionCompleted { success, .. } => !success,
            Self::ChildBlockBuffered { .. } | Self::BatchFinalized { .. } | Self::HaltCleared => {
                false
            }
        }
    }
}

/// Event topics for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// Subsystem 1 events.
    ParentChain,
    /// Subsystem 2 events.
    ChildProduction,
    /// Subsystem 3 events.
    Verification,
    /// Subsystems 4 and 5 events.
    Guards,
    /// Subsystem 7 events.
    Submission,
    /// Subsystem 8 events.
    Finalization,
    /// All topics.
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
    /// Only pass events for which [`BridgeEvent::is_warning`] holds.
    pub warnings_only: bool,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self {
            topics,
            warnings_only: false,
        }
    }

    /// Create a filter that passes warnings from every topic.
    #[must_use]
    pub fn warnings() -> Self {
        Self {
            topics: Vec::new(),
            warnings_only: true,
        }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &BridgeEvent) -> bool {
        let topic_match = self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic());

        topic_match && (!self.warnings_only || event.is_warning())
    }
}
