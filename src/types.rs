// src/types.rs
use clap::ValueEnum;
use std::fmt;

/// Lifecycle state of the supervised worker process
///
/// There is exactly one worker slot per supervisor, so this is also the
/// state of the whole mining subsystem.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum RunState {
    /// No worker process exists
    #[default]
    Idle,
    /// `start` accepted; the executable is being provisioned and spawned
    Starting,
    /// A worker process is alive and its output is being collected
    Running,
    /// The worker is being torn down
    Stopping,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Idle => write!(f, "idle"),
            RunState::Starting => write!(f, "starting"),
            RunState::Running => write!(f, "running"),
            RunState::Stopping => write!(f, "stopping"),
        }
    }
}

/// Typed telemetry extracted from a single line of worker output
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum TelemetryEvent {
    /// The pool accepted a submitted share
    ShareAccepted,
    /// The pool rejected a submitted share
    ShareRejected,
    /// Current hashrate in hashes per second
    HashrateSample(f64),
    /// Current share difficulty
    DifficultySample(f64),
    /// Anything else the worker prints
    Unrecognized,
}

/// Target platform ABI used to select the bundled worker binary
///
/// The identifiers match the directory names under the assets directory
/// (`<assets>/<abi>/<binary>`).
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Platform {
    /// 64-bit ARM
    #[clap(name = "arm64-v8a")]
    Arm64V8a,

    /// 32-bit ARMv7
    #[clap(name = "armeabi-v7a")]
    ArmeabiV7a,

    /// 64-bit x86
    #[clap(name = "x86_64")]
    X86_64,
}

impl Platform {
    /// Detects the platform this binary was compiled for
    ///
    /// # Returns
    /// `None` when there is no bundled worker build for this architecture
    pub fn current() -> Option<Self> {
        match std::env::consts::ARCH {
            "aarch64" => Some(Platform::Arm64V8a),
            "arm" => Some(Platform::ArmeabiV7a),
            "x86_64" => Some(Platform::X86_64),
            _ => None,
        }
    }

    /// ABI identifier, also the asset directory name
    pub fn abi(self) -> &'static str {
        match self {
            Platform::Arm64V8a => "arm64-v8a",
            Platform::ArmeabiV7a => "armeabi-v7a",
            Platform::X86_64 => "x86_64",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abi())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_abi_names() {
        assert_eq!(Platform::Arm64V8a.abi(), "arm64-v8a");
        assert_eq!(Platform::ArmeabiV7a.to_string(), "armeabi-v7a");
        assert_eq!(
            Platform::from_str("x86_64", false),
            Ok(Platform::X86_64)
        );
        assert!(Platform::from_str("mips", false).is_err());
    }

    #[test]
    fn test_run_state_display() {
        assert_eq!(RunState::default(), RunState::Idle);
        assert_eq!(RunState::Starting.to_string(), "starting");
        assert_eq!(RunState::Stopping.to_string(), "stopping");
    }
}
