//! Merge-mining bridge entry point.

use anyhow::{Context, Result};
use bridge_runtime::{BridgeAdapters, BridgeConfig, BridgeRuntime, Cli};
use bridge_telemetry::{init_telemetry, TelemetryConfig};
use clap::Parser;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = BridgeConfig::load(&cli).context("Failed to load configuration")?;
    if cli.print_config {
        println!(
            "{}",
            serde_json::to_string_pretty(&config).context("Failed to render configuration")?
        );
        return Ok(());
    }

    init_telemetry(&TelemetryConfig::from_env()).context("Failed to initialize telemetry")?;
    info!("Parent RPC: {}", config.parent.rpc_url);
    info!("DA RPC: {}", config.submission.da.rpc_url);
    info!("Settlement RPC: {}", config.submission.settlement.rpc_url);
    info!("Data Dir: {:?}", config.node.data_dir);

    let adapters = BridgeAdapters::from_config(&config)?;
    let runtime = BridgeRuntime::start(config, adapters).await?;
    runtime.run_until_ctrl_c().await
}
