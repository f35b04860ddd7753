use std::sync::Arc;

use shared_types::Timestamp;
use tracing::{debug, warn};

use super::config::TimingConfig;
use super::store::{TimingEntry, TimingStore};
use crate::error::GuardResult;

/// Outcome of scoring one parent height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingReport {
    /// Scored height.
    pub height: u64,
    /// Seconds since the previous height, when it is known.
    pub interval_secs: Option<i64>,
    /// Normalized deviation from the expected interval.
    pub score: f64,
    /// `score > threshold`.
    pub anomalous: bool,
}

impl TimingReport {
    fn genesis(height: u64) -> Self {
        Self {
            height,
            interval_secs: None,
            score: 0.0,
            anomalous: false,
        }
    }
}

/// Flags parent blocks whose spacing deviates too far from the expected block time.
pub struct TimingAnomalyDetector {
    store: Arc<dyn TimingStore>,
    config: TimingConfig,
}

impl TimingAnomalyDetector {
    /// Detector over `store`.
    pub fn new(store: Arc<dyn TimingStore>, config: TimingConfig) -> GuardResult<Self> {
        config.validate()?;
        Ok(Self { store, config })
    }

    /// Settings in use.
    pub fn config(&self) -> &TimingConfig {
        &self.config
    }

    /// Score `height` and record its entry.
    pub fn assess(
        &self,
        height: u64,
        timestamp: Timestamp,
        difficulty: u64,
    ) -> GuardResult<TimingReport> {
        let previous = match height.checked_sub(1) {
            Some(prev) => self.store.get(prev)?,
            None => None,
        };

        self.store.put(
            height,
            TimingEntry {
                timestamp,
                difficulty,
            },
        )?;
        let floor = height.saturating_sub(self.config.retention - 1);
        if floor > 0 {
            self.store.prune_below(floor)?;
        }

        let Some(previous) = previous else {
            debug!("[mb-04] Height {} has no predecessor, skipping score", height);
            return Ok(TimingReport::genesis(height));
        };

        // Timestamps come from the parent RPC and may sit anywhere in u64.
        let expected = i128::from(self.config.expected_interval_secs);
        let delta = i128::from(timestamp) - i128::from(previous.timestamp);
        let score = (delta - expected).unsigned_abs() as f64 / expected as f64;
        let anomalous = score > self.config.anomaly_threshold;
        let actual = delta.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64;

        if anomalous {
            warn!(
                "[mb-04] ⏱️ Timing anomaly at height {}: interval {}s, score {:.2} > {:.2}",
                height, actual, score, self.config.anomaly_threshold
            );
        }

        Ok(TimingReport {
            height,
            interval_secs: Some(actual),
            score,
            anomalous,
        })
    }

    /// `false` iff the interval ending at `height` is anomalous.
    ///
    /// A store failure is logged and treated as not anomalous.
    pub fn check_interval(&self, height: u64, timestamp: Timestamp, difficulty: u64) -> bool {
        match self.assess(height, timestamp, difficulty) {
            Ok(report) => !report.anomalous,
            Err(e) => {
                warn!("[mb-04] Timing store failed at height {}: {}", height, e);
                true
            }
        }
    }

    /// Number of heights currently retained.
    pub fn tracked_heights(&self) -> usize {
        self.store.len()
    }
}
