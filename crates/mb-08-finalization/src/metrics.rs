//! # Finalization Metrics
//!
//! Prometheus metrics for the merge-mining pipeline.
//!
//! Enable with the `metrics` feature:
//! ```toml
//! mb-08-finalization = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `bridge_child_blocks_finalized_total` - Child blocks finalized
//! - `bridge_proofs_built_total` - Merge-mining proofs built
//! - `bridge_parent_blocks_rejected_total` - Parent blocks rejected (by reason)
//! - `bridge_timing_anomalies_total` - Anomalous parent intervals
//! - `bridge_reorgs_total` - Reorgs evaluated (by decision)
//! - `bridge_pending_blocks` - Child blocks waiting in the buffer
//! - `bridge_halted` - 1 while halted
//! - `bridge_state` - State gauge (0=Idle .. 5=Halted)

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{
    register_gauge, register_int_counter, register_int_counter_vec, Gauge, IntCounter,
    IntCounterVec,
};

#[cfg(feature = "metrics")]
lazy_static! {
    /// Child blocks finalized
    pub static ref CHILD_BLOCKS_FINALIZED: IntCounter = register_int_counter!(
        "bridge_child_blocks_finalized_total",
        "Total number of child blocks finalized"
    )
    .expect("Failed to create CHILD_BLOCKS_FINALIZED metric");

    /// Proofs built
    pub static ref PROOFS_BUILT: IntCounter = register_int_counter!(
        "bridge_proofs_built_total",
        "Total number of merge-mining proofs built"
    )
    .expect("Failed to create PROOFS_BUILT metric");

    /// Parent blocks rejected, labeled by reason
    pub static ref PARENTS_REJECTED: IntCounterVec = register_int_counter_vec!(
        "bridge_parent_blocks_rejected_total",
        "Total number of parent blocks rejected",
        &["reason"]
    )
    .expect("Failed to create PARENTS_REJECTED metric");

    /// Timing anomalies
    pub static ref TIMING_ANOMALIES: IntCounter = register_int_counter!(
        "bridge_timing_anomalies_total",
        "Total number of anomalous parent block intervals"
    )
    .expect("Failed to create TIMING_ANOMALIES metric");

    /// Reorgs, labeled by decision
    pub static ref REORGS: IntCounterVec = register_int_counter_vec!(
        "bridge_reorgs_total",
        "Total number of reorgs evaluated",
        &["decision"]
    )
    .expect("Failed to create REORGS metric");

    /// Pending buffer size
    pub static ref PENDING_BLOCKS: Gauge = register_gauge!(
        "bridge_pending_blocks",
        "Child blocks waiting for a parent block"
    )
    .expect("Failed to create PENDING_BLOCKS metric");

    /// Halted flag
    pub static ref HALTED: Gauge = register_gauge!(
        "bridge_halted",
        "Whether the bridge is halted (0=no, 1=yes)"
    )
    .expect("Failed to create HALTED metric");

    /// State gauge
    pub static ref STATE: Gauge = register_gauge!(
        "bridge_state",
        "Orchestrator state (0=Idle, 1=Awaiting, 2=Verifying, 3=Committing, 4=Submitting, 5=Halted)"
    )
    .expect("Failed to create STATE metric");
}

// =============================================================================
// METRIC RECORDING FUNCTIONS
// =============================================================================

/// Record a finalized batch
#[cfg(feature = "metrics")]
pub fn record_batch_finalized(child_blocks: usize) {
    CHILD_BLOCKS_FINALIZED.inc_by(child_blocks as u64);
    PROOFS_BUILT.inc();
}

/// Record a rejected parent block
#[cfg(feature = "metrics")]
pub fn record_parent_rejected(reason: &str) {
    PARENTS_REJECTED.with_label_values(&[reason]).inc();
}

/// Record a timing anomaly
#[cfg(feature = "metrics")]
pub fn record_timing_anomaly() {
    TIMING_ANOMALIES.inc();
}

/// Record a reorg decision
#[cfg(feature = "metrics")]
pub fn record_reorg(decision: &str) {
    REORGS.with_label_values(&[decision]).inc();
}

/// Update pending buffer gauge
#[cfg(feature = "metrics")]
pub fn set_pending_blocks(count: usize) {
    PENDING_BLOCKS.set(count as f64);
}

/// Update state and halted gauges
#[cfg(feature = "metrics")]
pub fn set_state(state: u8, halted: bool) {
    STATE.set(f64::from(state));
    HALTED.set(if halted { 1.0 } else { 0.0 });
}

// =============================================================================
// NO-OP IMPLEMENTATIONS (when metrics feature disabled)
// =============================================================================

#[cfg(not(feature = "metrics"))]
pub fn record_batch_finalized(_child_blocks: usize) {}

#[cfg(not(feature = "metrics"))]
pub fn record_parent_rejected(_reason: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_timing_anomaly() {}

#[cfg(not(feature = "metrics"))]
pub fn record_reorg(_decision: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn set_pending_blocks(_count: usize) {}

#[cfg(not(feature = "metrics"))]
pub fn set_state(_state: u8, _halted: bool) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_callable() {
        record_batch_finalized(3);
        record_parent_rejected("pow_invalid");
        record_timing_anomaly();
        record_reorg("accept");
        set_pending_blocks(7);
        set_state(1, false);
    }
}
