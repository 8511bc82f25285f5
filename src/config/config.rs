// src/config/config.rs
use crate::utils::error::MinerError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Settings needed to launch one worker process
///
/// An immutable value: the supervisor receives a copy at `start` and never
/// writes back to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinerConfig {
    /// Payout wallet address (must not be blank to start mining)
    #[serde(default)]
    pub wallet_address: String,

    /// Pool address as `host:port` (without the `stratum+tcp://` scheme)
    #[serde(default = "default_pool_url")]
    pub pool_url: String,

    /// Worker name reported to the pool as `<wallet>.<worker>`
    #[serde(default = "default_worker_name")]
    pub worker_name: String,

    /// Number of CPU threads the worker may use
    /// (default: number of CPU cores)
    #[serde(default = "default_cpu_threads")]
    pub cpu_threads: usize,

    /// Hashing algorithm identifier passed to the worker
    #[serde(default = "default_algorithm")]
    pub algorithm: String,
}

/// A known mining pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolInfo {
    /// Display name
    pub name: &'static str,
    /// Host name
    pub host: &'static str,
    /// Stratum port
    pub port: u16,
    /// Region served
    pub region: &'static str,
}

impl PoolInfo {
    /// `host:port`, the form stored in [`MinerConfig::pool_url`]
    pub fn full_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Pools offered when no pool has been configured
pub const DEFAULT_POOLS: [PoolInfo; 5] = [
    PoolInfo {
        name: "Vipor NA",
        host: "na.vipor.net",
        port: 5040,
        region: "North America",
    },
    PoolInfo {
        name: "Vipor EU",
        host: "eu.vipor.net",
        port: 5040,
        region: "Europe",
    },
    PoolInfo {
        name: "Vipor ASIA",
        host: "asia.vipor.net",
        port: 5040,
        region: "Asia",
    },
    PoolInfo {
        name: "Vipor SA",
        host: "sa.vipor.net",
        port: 5040,
        region: "South America",
    },
    PoolInfo {
        name: "Luckpool",
        host: "pool.verus.io",
        port: 9998,
        region: "Global",
    },
];

fn default_pool_url() -> String {
    DEFAULT_POOLS[0].full_address()
}

fn default_worker_name() -> String {
    "android-miner".into()
}

fn default_cpu_threads() -> usize {
    num_cpus::get()
}

fn default_algorithm() -> String {
    "verus".into()
}

impl Default for MinerConfig {
    fn default() -> Self {
        MinerConfig {
            wallet_address: String::new(),
            pool_url: default_pool_url(),
            worker_name: default_worker_name(),
            cpu_threads: default_cpu_threads(),
            algorithm: default_algorithm(),
        }
    }
}

impl MinerConfig {
    /// Checks that a worker can be started with this configuration
    ///
    /// Only emptiness is checked; the pool decides whether a wallet
    /// address is actually valid.
    ///
    /// # Returns
    /// * `Err(MinerError::ConfigInvalid)` - If the wallet address is blank
    pub fn validate(&self) -> Result<(), MinerError> {
        if self.wallet_address.trim().is_empty() {
            return Err(MinerError::ConfigInvalid(
                "wallet address is blank".to_string(),
            ));
        }
        Ok(())
    }

    /// Thread count bounded to `1..=available hardware threads`
    pub fn effective_threads(&self) -> usize {
        self.cpu_threads.clamp(1, num_cpus::get().max(1))
    }

    /// Full stratum URL of the configured pool
    pub fn stratum_url(&self) -> String {
        format!("stratum+tcp://{}", self.pool_url)
    }

    /// Pool login in the `<wallet>.<worker>` form
    pub fn credential(&self) -> String {
        format!("{}.{}", self.wallet_address, self.worker_name)
    }

    /// Loads configuration from a file
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file (TOML format)
    ///
    /// # Returns
    /// * `Ok(MinerConfig)` - Successfully loaded configuration
    /// * `Err(MinerError)` - If file couldn't be read or parsed
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, MinerError> {
        let path = path.into();
        let config_str = std::fs::read_to_string(&path).map_err(|e| {
            MinerError::ConfigError(format!(
                "Failed to read config at {}: {}",
                path.display(),
                e
            ))
        })?;

        Ok(toml::from_str(&config_str)?)
    }

    /// Generates a configuration template string
    ///
    /// # Returns
    /// String containing a commented TOML configuration template
    pub fn generate_template() -> String {
        let mut template = String::new();
        template.push_str("# Verus Miner Configuration\n\n");
        template.push_str("# Payout wallet address (required)\n");
        template.push_str("wallet_address = \"your_wallet_address\"\n");
        template.push_str("# Pool as host:port. Known pools:\n");
        for pool in &DEFAULT_POOLS {
            template.push_str(&format!(
                "#   {} ({}): {}\n",
                pool.name,
                pool.region,
                pool.full_address()
            ));
        }
        template.push_str(&format!("pool_url = \"{}\"\n", default_pool_url()));
        template.push_str("# Worker name shown by the pool\n");
        template.push_str(&format!("worker_name = \"{}\"\n", default_worker_name()));
        template.push_str(&format!(
            "# CPU threads (1..={} on this machine)\n",
            num_cpus::get()
        ));
        template.push_str(&format!("cpu_threads = {}\n", default_cpu_threads()));
        template.push_str("# Worker algorithm\n");
        template.push_str(&format!("algorithm = \"{}\"\n", default_algorithm()));

        template
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_wallet_is_rejected() {
        let mut config = MinerConfig::default();
        assert!(matches!(
            config.validate(),
            Err(MinerError::ConfigInvalid(_))
        ));

        config.wallet_address = "   ".into();
        assert!(config.validate().is_err());

        config.wallet_address = "RWalletAddr".into();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_thread_count_is_bounded() {
        let mut config = MinerConfig {
            cpu_threads: 0,
            ..MinerConfig::default()
        };
        assert_eq!(config.effective_threads(), 1);

        config.cpu_threads = usize::MAX;
        assert_eq!(config.effective_threads(), num_cpus::get().max(1));
    }

    #[test]
    fn test_pool_credentials() {
        let config = MinerConfig {
            wallet_address: "RAddr".into(),
            worker_name: "rig1".into(),
            pool_url: "pool.verus.io:9998".into(),
            ..MinerConfig::default()
        };
        assert_eq!(config.credential(), "RAddr.rig1");
        assert_eq!(config.stratum_url(), "stratum+tcp://pool.verus.io:9998");
    }

    #[test]
    fn test_template_parses_to_defaults_with_placeholder_wallet() {
        let parsed: MinerConfig = toml::from_str(&MinerConfig::generate_template()).unwrap();
        assert_eq!(
            parsed,
            MinerConfig {
                wallet_address: "your_wallet_address".into(),
                ..MinerConfig::default()
            }
        );
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let parsed: MinerConfig = toml::from_str("wallet_address = \"RAddr\"").unwrap();
        assert_eq!(parsed.pool_url, "na.vipor.net:5040");
        assert_eq!(parsed.worker_name, "android-miner");
        assert_eq!(parsed.algorithm, "verus");
    }
}
