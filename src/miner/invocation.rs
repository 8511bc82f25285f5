// src/miner/invocation.rs
//! Worker command line and companion config file
//!
//! The worker is a ccminer-style binary. It is launched as
//! `-a <algo> -o stratum+tcp://<pool> -u <wallet>.<worker> -p x -t <threads>`
//! and a `config.json` with the same settings is written next to it for
//! builds that prefer a config file.

use crate::config::MinerConfig;
use crate::utils::error::MinerError;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Pool password; the pools we target ignore it
pub const POOL_PASSWORD: &str = "x";

/// File name of the companion config artifact
pub const ARTIFACT_NAME: &str = "config.json";

/// Everything needed to launch one worker process
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkerInvocation {
    /// Algorithm identifier
    pub algo: String,
    /// Full stratum URL
    pub url: String,
    /// Pool login as `<wallet>.<worker>`
    pub user: String,
    /// Pool password
    pub pass: String,
    /// CPU thread count, already bounded to the hardware
    pub threads: usize,
}

impl WorkerInvocation {
    /// Builds the invocation for a configuration
    pub fn from_config(config: &MinerConfig) -> Self {
        WorkerInvocation {
            algo: config.algorithm.clone(),
            url: config.stratum_url(),
            user: config.credential(),
            pass: POOL_PASSWORD.to_string(),
            threads: config.effective_threads(),
        }
    }

    /// Command-line arguments, program name excluded
    pub fn args(&self) -> Vec<String> {
        vec![
            "-a".into(),
            self.algo.clone(),
            "-o".into(),
            self.url.clone(),
            "-u".into(),
            self.user.clone(),
            "-p".into(),
            self.pass.clone(),
            "-t".into(),
            self.threads.to_string(),
        ]
    }

    /// Writes the JSON config artifact into `dir`
    ///
    /// # Returns
    /// Path of the written file
    pub fn write_artifact(&self, dir: &Path) -> Result<PathBuf, MinerError> {
        let path = dir.join(ARTIFACT_NAME);
        std::fs::write(&path, serde_json::to_string_pretty(self)?)?;
        Ok(path)
    }
}
