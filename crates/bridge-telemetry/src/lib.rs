//! # Bridge Telemetry
//!
//! Log and metric plumbing shared by the bridge binary.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bridge_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let config = TelemetryConfig::from_env();
//! init_telemetry(&config)?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `MB_LOG_LEVEL` / `RUST_LOG` | `info` | Filter directive |
//! | `MB_JSON_LOGS` | `false` (`true` in containers) | One JSON object per line |
//! | `MB_SERVICE_NAME` | `merge-bridge` | Reported in `bridge_build_info` |

#![warn(missing_docs)]

mod config;
mod logging;
mod metrics;

pub use config::TelemetryConfig;
pub use logging::build_filter;
pub use metrics::{render_metrics, BUILD_INFO};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// The log filter directive did not parse.
    #[error("Invalid log filter '{directive}': {reason}")]
    InvalidFilter {
        /// Offending directive
        directive: String,
        /// Parser message
        reason: String,
    },

    /// Another global subscriber is already installed.
    #[error("Failed to install tracing subscriber: {0}")]
    SubscriberInit(String),

    /// Prometheus text encoding failed.
    #[error("Failed to encode metrics: {0}")]
    MetricsEncode(String),
}

/// Install the global subscriber and publish build info.
///
/// Fails if called twice in one process.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    logging::init_logging(config)?;
    BUILD_INFO
        .with_label_values(&[&config.service_name, env!("CARGO_PKG_VERSION")])
        .set(1);
    tracing::info!(
        service = %config.service_name,
        json = config.json_logs,
        "Telemetry initialized"
    );
    Ok(())
}
