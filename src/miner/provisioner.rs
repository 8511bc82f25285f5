// src/miner/provisioner.rs
//! Worker executable provisioning
//!
//! The supervisor never ships the worker itself; it asks an
//! [`ExecutableProvisioner`] for a ready-to-run path. The bundled
//! implementation installs a per-platform binary out of an assets
//! directory laid out as `<assets>/<abi>/<binary>`.

use crate::types::Platform;
use crate::utils::error::MinerError;
use std::path::{Path, PathBuf};

/// Resolves an executable worker binary for a platform
pub trait ExecutableProvisioner: Send + Sync {
    /// Returns an absolute path to an executable worker for `platform`
    ///
    /// Implementations must be idempotent: calling this again when the
    /// binary is already in place must not redo the work.
    ///
    /// # Errors
    /// `MinerError::ProvisioningFailed` when no compatible binary exists or
    /// installing it fails
    fn provision(&self, platform: Platform) -> Result<PathBuf, MinerError>;
}

/// Installs the worker from a directory of per-ABI builds
#[derive(Debug, Clone)]
pub struct BundledProvisioner {
    /// Directory containing one sub-directory per ABI
    assets_dir: PathBuf,
    /// Private directory the binary is installed into
    install_dir: PathBuf,
    /// File name of the worker binary (e.g., "ccminer")
    binary_name: String,
}

impl BundledProvisioner {
    /// Creates a provisioner
    ///
    /// # Arguments
    /// * `assets_dir` - Directory with `<abi>/<binary_name>` builds
    /// * `install_dir` - Where the executable copy is placed
    /// * `binary_name` - Worker file name
    pub fn new(
        assets_dir: impl Into<PathBuf>,
        install_dir: impl Into<PathBuf>,
        binary_name: impl Into<String>,
    ) -> Self {
        BundledProvisioner {
            assets_dir: assets_dir.into(),
            install_dir: install_dir.into(),
            binary_name: binary_name.into(),
        }
    }

    fn install(&self, source: &Path, target: &Path) -> Result<(), MinerError> {
        std::fs::create_dir_all(&self.install_dir)?;
        let copied = std::fs::copy(source, target)?;
        log::debug!("Copied {} bytes to {}", copied, target.display());
        make_executable(target)?;
        Ok(())
    }
}

impl ExecutableProvisioner for BundledProvisioner {
    fn provision(&self, platform: Platform) -> Result<PathBuf, MinerError> {
        let target = self.install_dir.join(&self.binary_name);

        if target.is_file() {
            log::debug!("Worker already installed at {}, reusing", target.display());
        } else {
            let source = self
                .assets_dir
                .join(platform.abi())
                .join(&self.binary_name);
            if !source.is_file() {
                return Err(MinerError::ProvisioningFailed(format!(
                    "no {} build for {} at {}",
                    self.binary_name,
                    platform,
                    source.display()
                )));
            }

            log::info!("Installing {} worker for {}", self.binary_name, platform);
            self.install(&source, &target).map_err(|e| {
                // Never leave a half-copied binary behind to be "reused".
                let _ = std::fs::remove_file(&target);
                MinerError::ProvisioningFailed(format!(
                    "installing {} failed: {}",
                    target.display(),
                    e
                ))
            })?;
        }

        std::path::absolute(&target).map_err(|e| {
            MinerError::ProvisioningFailed(format!(
                "cannot resolve {}: {}",
                target.display(),
                e
            ))
        })
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
