//! # Merge-Mining Bridge Runtime
//!
//! Wires the bridge subsystems into one process.
//!
//! ## Modular Structure
//!
//! - `cli` - command-line flags
//! - `config` - layered configuration (defaults, TOML, env, flags)
//! - `runtime` - subsystem construction and task supervision
//! - `status` - HTTP status endpoint
//!
//! ## Startup Sequence
//!
//! 1. Load and validate configuration
//! 2. Open the nullifier store under the data directory
//! 3. Build verifier, guards, registry, proof builder and fan-out
//! 4. Bind the status endpoint
//! 5. Spawn orchestrator, parent poller and child producer
//! 6. Run until Ctrl+C, then drain in-flight submissions

pub mod cli;
pub mod config;
pub mod runtime;
pub mod status;

pub use cli::Cli;
pub use config::{BridgeConfig, ConfigError, NodeConfig};
pub use runtime::{BridgeAdapters, BridgeRuntime};
