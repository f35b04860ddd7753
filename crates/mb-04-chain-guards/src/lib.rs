//! # Chain Guards (Subsystem 4)
//!
//! Two guards that watch the parent chain and decide how much to trust it.
//!
//! ## Timing Anomaly Detector
//!
//! Scores each parent block interval against the expected block time:
//!
//! ```text
//! score = |actual - expected| / expected        anomalous iff score > threshold
//! ```
//!
//! The detector is advisory. It records every height and reports; whether an
//! anomaly rejects a block is the orchestrator's [`TimingPolicy`].
//!
//! ## Reorg Guard
//!
//! | Depth | Decision | Side effect |
//! |-------|----------|-------------|
//! | `<= acceptable_depth` | `Accept` | none |
//! | `<= max_reorg_depth` | `AcceptWithPenalty` | slash implicated validators, drop stakes under the floor |
//! | deeper | `EmergencyHalt` | none here; the orchestrator halts |
//!
//! Both guards persist through injected store ports with in-memory adapters.

#![warn(missing_docs)]

pub mod error;
pub mod reorg;
pub mod timing;

pub use error::{GuardError, GuardResult};
pub use reorg::{
    InMemoryStakeStore, ReorgConfig, ReorgGuard, ReorgOutcome, SlashRecord, StakeStore,
};
pub use timing::{
    InMemoryTimingStore, TimingAnomalyDetector, TimingConfig, TimingEntry, TimingPolicy,
    TimingReport, TimingStore,
};
