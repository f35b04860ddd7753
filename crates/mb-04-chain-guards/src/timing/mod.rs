//! Parent block interval scoring.

mod config;
mod detector;
mod store;

pub use config::{TimingConfig, TimingPolicy};
pub use detector::{TimingAnomalyDetector, TimingReport};
pub use store::{InMemoryTimingStore, TimingEntry, TimingStore};
