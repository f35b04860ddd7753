use serde::{Deserialize, Serialize};

use crate::error::{GuardError, GuardResult};

/// What the orchestrator does with an anomalous interval.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimingPolicy {
    /// Publish a warning and keep going.
    #[default]
    Advisory,
    /// Treat the parent block as invalid.
    Reject,
}

/// Timing detector settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Expected parent block interval in seconds.
    pub expected_interval_secs: u64,
    /// Score above which an interval is anomalous.
    pub anomaly_threshold: f64,
    /// Heights kept in the store.
    pub retention: u64,
    /// Orchestrator reaction.
    pub policy: TimingPolicy,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            expected_interval_secs: 480,
            anomaly_threshold: 3.0,
            retention: 1024,
            policy: TimingPolicy::Advisory,
        }
    }
}

impl TimingConfig {
    /// Reject values that make scoring meaningless.
    pub fn validate(&self) -> GuardResult<()> {
        if self.expected_interval_secs == 0 {
            return Err(GuardError::InvalidConfig(
                "expected_interval_secs must be positive".into(),
            ));
        }
        if !self.anomaly_threshold.is_finite() || self.anomaly_threshold <= 0.0 {
            return Err(GuardError::InvalidConfig(format!(
                "anomaly_threshold must be a positive number, got {}",
                self.anomaly_threshold
            )));
        }
        if self.retention < 2 {
            return Err(GuardError::InvalidConfig(
                "retention must keep at least two heights".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_defaults_to_advisory() {
        let config: TimingConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.policy, TimingPolicy::Advisory);
        assert_eq!(config.expected_interval_secs, 480);

        let config: TimingConfig = serde_json::from_str(r#"{"policy":"reject"}"#).unwrap();
        assert_eq!(config.policy, TimingPolicy::Reject);
    }

    #[test]
    fn test_validate() {
        assert!(TimingConfig::default().validate().is_ok());
        let mut config = TimingConfig::default();
        config.expected_interval_secs = 0;
        assert!(config.validate().is_err());
        let mut config = TimingConfig::default();
        config.anomaly_threshold = f64::NAN;
        assert!(config.validate().is_err());
    }
}
