//! Verus Miner - supervisor for an external CPU mining worker
//!
//! This crate launches a ccminer-style worker process and turns its console
//! output into live mining statistics:
//! - Provisioning of the worker binary for the current platform
//! - A start/stop state machine with one worker at a time
//! - Parsing of share, hashrate and difficulty lines
//! - Publish/subscribe distribution of statistics snapshots
//! - Persistent miner configuration

#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Worker provisioning, invocation and process supervision
pub mod miner;

/// Statistics parsing, aggregation and distribution
pub mod stats;

/// Utility functions and error handling
pub mod utils;

/// Command-line interface definitions
pub mod cli;

/// Configuration management
pub mod config;

/// Shared type definitions
pub mod types;

// Core exports
pub use cli::Commands;
pub use config::{ConfigStore, MinerConfig};
pub use miner::{BundledProvisioner, ExecutableProvisioner, ProcessSupervisor, WorkerInvocation};
pub use stats::{MiningStats, NotificationSink, Snapshot, StateBroadcaster, Subscription};
pub use types::{Platform, RunState, TelemetryEvent};
pub use utils::{MinerError, init_logging};
