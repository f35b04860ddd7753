//! Prometheus text exposition for the default registry.
//!
//! Subsystem crates register their own metrics (see `mb-08-finalization`
//! with the `metrics` feature); this module only renders them.

use lazy_static::lazy_static;
use prometheus::{register_int_gauge_vec, Encoder, IntGaugeVec, TextEncoder};

use crate::TelemetryError;

lazy_static! {
    /// Constant 1, labeled with the service name and crate version
    pub static ref BUILD_INFO: IntGaugeVec = register_int_gauge_vec!(
        "bridge_build_info",
        "Build information for the merge-mining bridge",
        &["service", "version"]
    )
    .expect("Failed to create BUILD_INFO metric");
}

/// Render every registered metric in the Prometheus text format.
pub fn render_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsEncode(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsEncode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_includes_build_info() {
        BUILD_INFO.with_label_values(&["test", "0.0.0"]).set(1);
        let text = render_metrics().unwrap();
        assert!(text.contains("bridge_build_info"));
        assert!(text.contains("service=\"test\""));
    }
}
