// src/cli/commands.rs
use crate::types::Platform;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Verus Miner CLI - supervises an external CPU mining worker
#[derive(Parser, Debug)]
#[command(name = "verus-miner-rs")]
#[command(version, about, long_about = None)]
pub struct Commands {
    /// Log every worker output line and telemetry update
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The action to perform
    #[command(subcommand)]
    pub action: Action,
}

/// Top-level commands for the miner application
#[derive(Subcommand, Debug)]
pub enum Action {
    /// Start the worker and report statistics until interrupted
    Start(StartOptions),

    /// Generate configuration file template
    Config(ConfigOptions),

    /// Save individual settings to the configuration file
    Set(SetOptions),

    /// List the built-in pools
    Pools,
}

/// Options for starting the worker
#[derive(Parser, Debug)]
pub struct StartOptions {
    /// Path to configuration file
    #[arg(short, long, default_value = "miner.toml")]
    pub config: PathBuf,

    /// Wallet address (overrides config)
    #[arg(short, long)]
    pub wallet: Option<String>,

    /// Pool as host:port (overrides config)
    #[arg(short, long)]
    pub pool: Option<String>,

    /// Worker name (overrides config)
    #[arg(short = 'n', long)]
    pub worker: Option<String>,

    /// Number of CPU threads (overrides config)
    #[arg(short, long)]
    pub threads: Option<usize>,

    /// Directory holding `<abi>/<binary>` worker builds
    #[arg(long, default_value = "assets/ccminer")]
    pub assets: PathBuf,

    /// Private directory the worker is installed into and runs in
    #[arg(long, default_value = "miner-data")]
    pub work_dir: PathBuf,

    /// File name of the worker binary
    #[arg(long, default_value = "ccminer")]
    pub binary: String,

    /// Platform ABI to provision for (default: detected)
    #[arg(long)]
    pub platform: Option<Platform>,

    /// Print every snapshot to stdout as one JSON object per line
    #[arg(long)]
    pub json: bool,
}

/// Options for generating configuration files
#[derive(Parser, Debug)]
pub struct ConfigOptions {
    /// Output file path
    #[arg(short, long, default_value = "miner.toml")]
    pub output: PathBuf,
}

/// Settings to persist; at least one is required
#[derive(Args, Debug)]
#[group(required = true, multiple = true)]
pub struct SetFields {
    /// Wallet address
    #[arg(short, long)]
    pub wallet: Option<String>,

    /// Pool as host:port
    #[arg(short, long)]
    pub pool: Option<String>,

    /// Worker name
    #[arg(short = 'n', long)]
    pub worker: Option<String>,

    /// Number of CPU threads
    #[arg(short, long)]
    pub threads: Option<usize>,
}

/// Options for saving settings
#[derive(Parser, Debug)]
pub struct SetOptions {
    /// Path to configuration file
    #[arg(short, long, default_value = "miner.toml")]
    pub config: PathBuf,

    /// Values to save
    #[command(flatten)]
    pub fields: SetFields,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_overrides_parse() {
        let cli = Commands::parse_from([
            "verus-miner-rs",
            "start",
            "--wallet",
            "RAddr",
            "--threads",
            "2",
            "--platform",
            "arm64-v8a",
        ]);
        match cli.action {
            Action::Start(opts) => {
                assert_eq!(opts.wallet.as_deref(), Some("RAddr"));
                assert_eq!(opts.threads, Some(2));
                assert_eq!(opts.platform, Some(Platform::Arm64V8a));
                assert_eq!(opts.binary, "ccminer");
                assert!(!opts.json);
            }
            other => panic!("unexpected action {:?}", other),
        }
    }

    #[test]
    fn test_start_json_flag() {
        let cli = Commands::parse_from(["verus-miner-rs", "start", "--json"]);
        assert!(matches!(cli.action, Action::Start(StartOptions { json: true, .. })));
    }

    #[test]
    fn test_set_requires_a_field() {
        assert!(Commands::try_parse_from(["verus-miner-rs", "set"]).is_err());
        assert!(Commands::try_parse_from(["verus-miner-rs", "set", "-p", "pool.verus.io:9998"]).is_ok());
    }
}
