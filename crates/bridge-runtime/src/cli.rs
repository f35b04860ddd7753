//! Command-line flags.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

/// Merge-mining finalization bridge.
#[derive(Debug, Default, Clone, Parser)]
#[command(name = "bridge-runtime", version, about)]
pub struct Cli {
    /// TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory for persistent state
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Status HTTP listen address
    #[arg(long, value_name = "ADDR")]
    pub status_addr: Option<SocketAddr>,

    /// Disable the status HTTP listener
    #[arg(long, conflicts_with = "status_addr")]
    pub no_status: bool,

    /// Parent chain JSON-RPC endpoint
    #[arg(long, value_name = "URL")]
    pub parent_rpc_url: Option<String>,

    /// Data-availability JSON-RPC endpoint
    #[arg(long, value_name = "URL")]
    pub da_rpc_url: Option<String>,

    /// Settlement JSON-RPC endpoint
    #[arg(long, value_name = "URL")]
    pub settlement_rpc_url: Option<String>,

    /// Print the resolved configuration as JSON and exit
    #[arg(long)]
    pub print_config: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_flags() {
        let cli = Cli::parse_from([
            "bridge-runtime",
            "--config",
            "bridge.toml",
            "--status-addr",
            "127.0.0.1:9000",
            "--parent-rpc-url",
            "http://parent",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("bridge.toml")));
        assert_eq!(cli.status_addr, Some("127.0.0.1:9000".parse().unwrap()));
        assert_eq!(cli.parent_rpc_url.as_deref(), Some("http://parent"));
        assert!(!cli.no_status);
    }

    #[test]
    fn test_no_status_conflicts_with_addr() {
        let result = Cli::try_parse_from([
            "bridge-runtime",
            "--no-status",
            "--status-addr",
            "127.0.0.1:9000",
        ]);
        assert!(result.is_err());
    }
}
