// src/miner/mod.rs
//! Worker process management
//!
//! This module contains all components related to running the external
//! hashing worker:
//! - Provisioning of the platform-specific worker executable
//! - Building the worker's command line and companion config
//! - Supervising the worker process and collecting its telemetry

/// Worker executable provisioning
///
/// Defines the [`ExecutableProvisioner`] seam and the bundled-assets
/// implementation that installs a binary per platform ABI.
pub mod provisioner;

/// Worker command line and config artifact
pub mod invocation;

/// Worker process supervisor
///
/// Runs the start/stop state machine, reads the worker's output and keeps
/// the statistics snapshot current.
pub mod supervisor;

// Re-export main components for cleaner imports
pub use self::invocation::WorkerInvocation;
pub use self::provisioner::{BundledProvisioner, ExecutableProvisioner};
pub use self::supervisor::ProcessSupervisor;
