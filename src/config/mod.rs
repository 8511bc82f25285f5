// src/config/mod.rs
//! Configuration management for the miner supervisor
//!
//! This module handles all configuration-related functionality including:
//! - The [`MinerConfig`] value handed to the supervisor
//! - The list of known default pools
//! - Loading, saving and watching the persisted configuration
//! - Generating configuration templates
//!
//! The configuration uses TOML format.

/// Core configuration implementation
///
/// Contains the [`MinerConfig`] struct and the default pool list.
pub mod config;

/// File-backed configuration store with change notifications
pub mod store;

// Re-export key items for easy access
pub use config::{DEFAULT_POOLS, MinerConfig, PoolInfo};
pub use store::ConfigStore;

/// Generates a commented configuration template
///
/// # Returns
/// String containing a ready-to-use TOML configuration template
pub fn generate_template() -> String {
    MinerConfig::generate_template()
}
