//! Orchestrator configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Finalization orchestrator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FinalizationConfig {
    /// Capacity of the child block and parent event channels.
    pub channel_capacity: usize,
    /// How long shutdown waits for in-flight submissions.
    pub shutdown_grace_secs: u64,
}

impl Default for FinalizationConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 64,
            shutdown_grace_secs: 30,
        }
    }
}

impl FinalizationConfig {
    /// Shutdown grace period as a duration.
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}
