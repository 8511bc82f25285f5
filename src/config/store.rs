// src/config/store.rs
//! Persistent storage for [`MinerConfig`]
//!
//! The configuration lives in a single TOML file. Every save rewrites the
//! file and then publishes the new value on a [`watch`] channel, so readers
//! can follow changes live instead of re-reading the file.

use crate::config::config::MinerConfig;
use crate::utils::error::MinerError;
use std::path::{Path, PathBuf};
use tokio::sync::{Mutex, watch};

/// File-backed configuration store with a live change stream
pub struct ConfigStore {
    path: PathBuf,
    tx: watch::Sender<MinerConfig>,
    /// Serializes read-modify-write cycles of concurrent saves
    write_lock: Mutex<()>,
}

impl ConfigStore {
    /// Opens the store at `path`
    ///
    /// A missing file yields the default configuration; it is created on
    /// the first save.
    ///
    /// # Errors
    /// Returns `MinerError::ConfigError` if the file exists but cannot be
    /// read or parsed
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, MinerError> {
        let path = path.into();
        let config = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No config at {}, using defaults", path.display());
                MinerConfig::default()
            }
            Err(e) => {
                return Err(MinerError::ConfigError(format!(
                    "Failed to read config at {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        let (tx, _rx) = watch::channel(config);
        Ok(ConfigStore {
            path,
            tx,
            write_lock: Mutex::new(()),
        })
    }

    /// Location of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current configuration
    pub fn current(&self) -> MinerConfig {
        self.tx.borrow().clone()
    }

    /// Live stream of configuration changes, starting at the current value
    pub fn watch(&self) -> watch::Receiver<MinerConfig> {
        self.tx.subscribe()
    }

    /// Saves a new wallet address
    pub async fn save_wallet_address(&self, address: &str) -> Result<(), MinerError> {
        self.update(|c| c.wallet_address = address.to_string()).await
    }

    /// Saves a new pool address (`host:port`)
    pub async fn save_pool_url(&self, url: &str) -> Result<(), MinerError> {
        self.update(|c| c.pool_url = url.to_string()).await
    }

    /// Saves a new worker name
    pub async fn save_worker_name(&self, name: &str) -> Result<(), MinerError> {
        self.update(|c| c.worker_name = name.to_string()).await
    }

    /// Saves a new CPU thread count
    pub async fn save_cpu_threads(&self, threads: usize) -> Result<(), MinerError> {
        self.update(|c| c.cpu_threads = threads).await
    }

    /// Replaces the whole configuration
    pub async fn save(&self, config: MinerConfig) -> Result<(), MinerError> {
        self.update(|c| *c = config).await
    }

    async fn update(&self, edit: impl FnOnce(&mut MinerConfig)) -> Result<(), MinerError> {
        let _guard = self.write_lock.lock().await;

        let mut config = self.current();
        edit(&mut config);

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, toml::to_string_pretty(&config)?).await?;

        self.tx.send_replace(config);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::open(dir.path().join("miner.toml")).await.unwrap();
        assert_eq!(store.current(), MinerConfig::default());
    }

    #[tokio::test]
    async fn test_field_saves_persist_and_publish() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("miner.toml");
        let store = ConfigStore::open(&path).await.unwrap();
        let mut changes = store.watch();

        store.save_wallet_address("RAddr").await.unwrap();
        assert!(changes.has_changed().unwrap());
        assert_eq!(changes.borrow_and_update().wallet_address, "RAddr");

        store.save_pool_url("pool.verus.io:9998").await.unwrap();
        store.save_worker_name("rig7").await.unwrap();
        store.save_cpu_threads(2).await.unwrap();

        let reopened = ConfigStore::open(&path).await.unwrap().current();
        assert_eq!(reopened.wallet_address, "RAddr");
        assert_eq!(reopened.pool_url, "pool.verus.io:9998");
        assert_eq!(reopened.worker_name, "rig7");
        assert_eq!(reopened.cpu_threads, 2);
        assert_eq!(changes.borrow_and_update().clone(), reopened);
    }

    #[tokio::test]
    async fn test_bulk_save_replaces_everything() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::open(dir.path().join("miner.toml")).await.unwrap();
        let config = MinerConfig {
            wallet_address: "RAddr".into(),
            worker_name: "bulk".into(),
            cpu_threads: 1,
            ..MinerConfig::default()
        };

        store.save(config.clone()).await.unwrap();
        assert_eq!(store.current(), config);
        assert_eq!(MinerConfig::load(store.path()).unwrap(), config);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("miner.toml");
        std::fs::write(&path, "cpu_threads = \"many\"").unwrap();

        assert!(matches!(
            ConfigStore::open(&path).await,
            Err(MinerError::ConfigError(_))
        ));
    }
}
