//! # CLI Interface
//!
//! Defines the command-line argument structure for `xaro-server` using
//! `clap` derive. Supports three subcommands: `run`, `code` and `version`.

use clap::{Parser, Subcommand};

use xaro_ledger::config::{DEFAULT_API_PORT, DEFAULT_METRICS_PORT};

use crate::logging::LogFormat;

/// XARO wallet backend.
///
/// Serves the REST API the wallet client uses to record transfers, list
/// history, and claim rewards. All records live in memory.
#[derive(Parser, Debug)]
#[command(
    name = "xaro-server",
    about = "XARO wallet backend",
    version,
    propagate_version = true
)]
pub struct XaroCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the API server.
    Run(RunArgs),
    /// Print the transaction code for a hash and exit.
    Code(CodeArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Interface to bind both listeners on.
    #[arg(long, env = "XARO_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port for the REST API.
    #[arg(long, short = 'p', env = "XARO_PORT", default_value_t = DEFAULT_API_PORT)]
    pub port: u16,

    /// Port for the Prometheus metrics endpoint.
    #[arg(long, env = "XARO_METRICS_PORT", default_value_t = DEFAULT_METRICS_PORT)]
    pub metrics_port: u16,

    /// Log output format.
    #[arg(long, env = "XARO_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

/// Arguments for the `code` subcommand.
#[derive(Parser, Debug)]
pub struct CodeArgs {
    /// Transaction hash, hex, with or without the `0x` prefix.
    pub tx_hash: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        XaroCli::command().debug_assert();
    }

    #[test]
    fn run_defaults() {
        let cli = XaroCli::try_parse_from(["xaro-server", "run"]).unwrap();
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.port, DEFAULT_API_PORT);
                assert_eq!(args.metrics_port, DEFAULT_METRICS_PORT);
                assert_eq!(args.log_format, LogFormat::Pretty);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn run_accepts_json_logs() {
        let cli = XaroCli::try_parse_from(["xaro-server", "run", "--log-format", "json", "-p", "8080"])
            .unwrap();
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.port, 8080);
                assert_eq!(args.log_format, LogFormat::Json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn code_takes_positional_hash() {
        let cli = XaroCli::try_parse_from(["xaro-server", "code", "0xaabb"]).unwrap();
        match cli.command {
            Commands::Code(args) => assert_eq!(args.tx_hash, "0xaabb"),
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
