// src/utils/error.rs
use std::io;
use thiserror::Error;

/// Main error type for the miner supervisor
///
/// This enum represents every failure that can stop a worker from being
/// started or a configuration from being loaded or saved. Failures inside
/// a running worker (stream errors, unparsable output) never surface here;
/// they only show up as a run state transition.
#[derive(Error, Debug)]
pub enum MinerError {
    /// The miner configuration cannot be used to start a worker
    /// (e.g., blank wallet address)
    #[error("Invalid miner configuration: {0}")]
    ConfigInvalid(String),

    /// No usable worker executable for this platform, or installing it failed
    #[error("Worker provisioning failed: {0}")]
    ProvisioningFailed(String),

    /// The operating system refused to create the worker process
    #[error("Failed to spawn worker process: {0}")]
    SpawnFailed(#[source] io::Error),

    /// Configuration file read, parse or write errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Standard I/O operation errors
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Async task execution errors
    #[error("Task execution error: {0}")]
    TaskError(String),
}

/// Converts TOML serialization errors into MinerError
///
/// Used when the persisted miner configuration cannot be written back.
impl From<toml::ser::Error> for MinerError {
    fn from(e: toml::ser::Error) -> Self {
        MinerError::ConfigError(format!("Failed to serialize config: {}", e))
    }
}

/// Converts TOML parse errors into MinerError
impl From<toml::de::Error> for MinerError {
    fn from(e: toml::de::Error) -> Self {
        MinerError::ConfigError(format!("Invalid config format: {}", e))
    }
}

/// Converts async task join errors into MinerError
///
/// Used when background tasks fail unexpectedly, including:
/// - Worker output readers
/// - Uptime tick loops
/// Wraps the original error in a `TaskError` variant.
impl From<tokio::task::JoinError> for MinerError {
    fn from(e: tokio::task::JoinError) -> Self {
        MinerError::TaskError(format!("Async task failed: {}", e))
    }
}
