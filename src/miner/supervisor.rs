// src/miner/supervisor.rs
//! Worker process supervisor
//!
//! Owns the single worker process slot and its state machine:
//!
//! ```text
//! Idle --start--> Starting --spawned--> Running --stop / exit--> Idle
//!                    |  \--stop--> Stopping --spawn done--> Idle
//!                    \--provision/spawn failed--> Idle
//! ```
//!
//! Every run gets a new epoch. The reader and tick tasks capture the epoch
//! they were launched for and drop any update once it is no longer current,
//! so a late line from a stopped run can never leak into the next one.
//!
//! All live state (run state, epoch, stats, child handle) sits behind one
//! mutex, and snapshots are published while that mutex is held, which keeps
//! the order observers see identical to the order of mutation.

use crate::config::MinerConfig;
use crate::miner::invocation::WorkerInvocation;
use crate::miner::provisioner::ExecutableProvisioner;
use crate::stats::{
    LogNotifier, NotificationSink, Snapshot, StateBroadcaster, StatsAggregator, Subscription,
    parse_line,
};
use crate::types::{Platform, RunState, TelemetryEvent};
use crate::utils::error::MinerError;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::{Duration, Instant};
use sysinfo::Components;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};

/// Default period of the uptime tick
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Mutable state shared by the supervisor and its background tasks
#[derive(Default)]
struct Live {
    run_state: RunState,
    epoch: u64,
    aggregator: StatsAggregator,
    child: Option<Child>,
}

/// Fixed collaborators and parameters of a supervisor
#[derive(Clone)]
struct Settings {
    provisioner: Arc<dyn ExecutableProvisioner>,
    notifier: Arc<dyn NotificationSink>,
    platform: Option<Platform>,
    work_dir: PathBuf,
    tick_interval: Duration,
}

struct Shared {
    live: Mutex<Live>,
    broadcaster: StateBroadcaster,
    settings: Settings,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Live> {
        self.live.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Publishes the state held by `live`; callers keep the lock
    fn publish(&self, live: &Live) -> Snapshot {
        let snapshot = Snapshot {
            running: live.run_state == RunState::Running,
            stats: live.aggregator.stats(),
        };
        self.broadcaster.publish(snapshot.clone());
        snapshot
    }

    /// Drops the child, zeroes the stats and returns to `Idle`
    fn reset_to_idle(&self, live: &mut Live) -> (Option<Child>, Snapshot) {
        let child = live.child.take();
        live.aggregator.reset();
        live.run_state = RunState::Idle;
        (child, self.publish(live))
    }

    /// Applies one event for run `epoch`
    ///
    /// Returns `false` once the run is no longer current.
    fn apply(&self, epoch: u64, event: &TelemetryEvent) -> bool {
        let mut live = self.lock();
        if live.epoch != epoch || live.run_state != RunState::Running {
            return false;
        }
        if *event != TelemetryEvent::Unrecognized {
            live.aggregator.apply(event);
            self.publish(&live);
        }
        true
    }

    /// Advances the uptime clock for run `epoch`
    fn tick(&self, epoch: u64, now: Instant, temperature: Option<f32>) -> Option<Snapshot> {
        let mut live = self.lock();
        if live.epoch != epoch || live.run_state != RunState::Running {
            return None;
        }
        live.aggregator.tick(now);
        live.aggregator.record_temperature(temperature);
        Some(self.publish(&live))
    }

    /// End of worker output for run `epoch`
    async fn worker_exited(&self, epoch: u64) {
        let (child, snapshot) = {
            let mut live = self.lock();
            if live.epoch != epoch || live.run_state != RunState::Running {
                return;
            }
            self.reset_to_idle(&mut live)
        };
        self.settings.notifier.notify(&snapshot);

        let Some(mut child) = child else {
            log::warn!("Worker output ended");
            return;
        };
        // Closed output does not mean the process is gone.
        if let Err(e) = child.start_kill() {
            log::debug!("Kill signal not delivered: {}", e);
        }
        match child.wait().await {
            Ok(status) => log::warn!("Worker output ended, process exited: {}", status),
            Err(e) => log::warn!("Worker output ended, exit status unavailable: {}", e),
        }
    }
}

/// Supervises one external worker process at a time
///
/// Cloning is cheap; all clones control the same worker. The worker is
/// killed once the last clone is dropped.
#[derive(Clone)]
pub struct ProcessSupervisor {
    shared: Arc<Shared>,
}

impl ProcessSupervisor {
    /// Creates an idle supervisor
    ///
    /// # Arguments
    /// * `provisioner` - Source of the worker executable
    /// * `work_dir` - Private writable directory the worker runs in
    pub fn new(provisioner: Arc<dyn ExecutableProvisioner>, work_dir: impl Into<PathBuf>) -> Self {
        Self::with_settings(Settings {
            provisioner,
            notifier: Arc::new(LogNotifier),
            platform: Platform::current(),
            work_dir: work_dir.into(),
            tick_interval: TICK_INTERVAL,
        })
    }

    /// Replaces the notification sink (default: [`LogNotifier`])
    pub fn with_notifier(self, notifier: Arc<dyn NotificationSink>) -> Self {
        self.rebuild(|s| s.notifier = notifier)
    }

    /// Overrides the detected platform
    pub fn with_platform(self, platform: Platform) -> Self {
        self.rebuild(|s| s.platform = Some(platform))
    }

    /// Overrides the uptime tick period
    pub fn with_tick_interval(self, tick_interval: Duration) -> Self {
        self.rebuild(|s| s.tick_interval = tick_interval)
    }

    fn with_settings(settings: Settings) -> Self {
        ProcessSupervisor {
            shared: Arc::new(Shared {
                live: Mutex::new(Live::default()),
                broadcaster: StateBroadcaster::new(),
                settings,
            }),
        }
    }

    /// Builder helper; a supervisor that already ran keeps its own state
    fn rebuild(self, edit: impl FnOnce(&mut Settings)) -> Self {
        let mut settings = self.shared.settings.clone();
        edit(&mut settings);
        Self::with_settings(settings)
    }

    /// Current run state
    pub fn state(&self) -> RunState {
        self.shared.lock().run_state
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> Snapshot {
        self.shared.broadcaster.latest()
    }

    /// Registers an observer; it immediately receives the current snapshot
    pub fn subscribe(&self) -> Subscription {
        self.shared.broadcaster.subscribe()
    }

    /// Starts a worker for `config`
    ///
    /// Returns as soon as the process exists; telemetry arrives through
    /// [`subscribe`](Self::subscribe). Does nothing if a worker is already
    /// starting or running.
    ///
    /// # Errors
    /// - `MinerError::ConfigInvalid` if the wallet address is blank
    /// - `MinerError::ProvisioningFailed` if no worker binary is available
    /// - `MinerError::SpawnFailed` if the process cannot be created
    ///
    /// The supervisor is back in `Idle` whenever an error is returned.
    pub async fn start(&self, config: MinerConfig) -> Result<(), MinerError> {
        let epoch = {
            let mut live = self.shared.lock();
            if live.run_state != RunState::Idle {
                log::debug!("Worker already {}, ignoring start", live.run_state);
                return Ok(());
            }
            config.validate()?;
            live.run_state = RunState::Starting;
            live.epoch += 1;
            live.epoch
        };
        log::info!(
            "Starting worker: algo={} pool={} threads={}",
            config.algorithm,
            config.pool_url,
            config.effective_threads()
        );

        let launched = self.launch(&config).await;

        let outcome = 'locked: {
            let mut live = self.shared.lock();
            if live.run_state == RunState::Stopping {
                log::info!("Start cancelled by stop");
                let (_, snapshot) = self.shared.reset_to_idle(&mut live);
                drop(live);
                self.shared.settings.notifier.notify(&snapshot);
                break 'locked Err(launched.ok());
            }

            let mut child = match launched {
                Ok(child) => child,
                Err(e) => {
                    log::error!("Failed to start worker: {}", e);
                    self.shared.reset_to_idle(&mut live);
                    return Err(e);
                }
            };

            let stdout = child.stdout.take();
            let stderr = child.stderr.take();
            live.aggregator.start(Instant::now());
            live.child = Some(child);
            live.run_state = RunState::Running;
            Ok((self.shared.publish(&live), stdout, stderr))
        };
        let (snapshot, stdout, stderr) = match outcome {
            Ok(parts) => parts,
            Err(cancelled) => {
                // stop() arrived while we were spawning
                if let Some(mut child) = cancelled {
                    if let Err(e) = child.kill().await {
                        log::debug!("Cancelled worker not reaped: {}", e);
                    }
                }
                return Ok(());
            }
        };
        log::info!("Worker running (run #{})", epoch);

        let (tx, rx) = mpsc::unbounded_channel();
        if let Some(stdout) = stdout {
            tokio::spawn(pump_lines(stdout, tx.clone()));
        }
        if let Some(stderr) = stderr {
            tokio::spawn(pump_lines(stderr, tx));
        }
        tokio::spawn(read_output(Arc::downgrade(&self.shared), epoch, rx));
        tokio::spawn(tick_loop(
            Arc::downgrade(&self.shared),
            epoch,
            self.shared.settings.tick_interval,
        ));

        self.shared.settings.notifier.notify(&snapshot);
        Ok(())
    }

    /// Stops the worker
    ///
    /// Kills the process without waiting for it, zeroes the statistics and
    /// returns to `Idle`. A stop during `Starting` is handed to the pending
    /// start, which tears the fresh process down. No-op when idle.
    pub fn stop(&self) {
        let snapshot = {
            let mut live = self.shared.lock();
            match live.run_state {
                RunState::Idle | RunState::Stopping => return,
                RunState::Starting => {
                    live.run_state = RunState::Stopping;
                    return;
                }
                RunState::Running => {}
            }

            let (child, snapshot) = self.shared.reset_to_idle(&mut live);
            if let Some(mut child) = child {
                // Already exited is fine; the reader notices end of output.
                if let Err(e) = child.start_kill() {
                    log::debug!("Kill signal not delivered: {}", e);
                }
            }
            snapshot
        };
        log::info!("Worker stopped");
        self.shared.settings.notifier.notify(&snapshot);
    }

    /// Resolves the executable, writes the companion config and spawns
    async fn launch(&self, config: &MinerConfig) -> Result<Child, MinerError> {
        let invocation = WorkerInvocation::from_config(config);
        let provisioner = Arc::clone(&self.shared.settings.provisioner);
        let platform = self.shared.settings.platform;
        let work_dir = self.shared.settings.work_dir.clone();
        let artifact = invocation.clone();

        let executable = tokio::task::spawn_blocking(move || {
            let platform = platform.ok_or_else(|| {
                MinerError::ProvisioningFailed(format!(
                    "unsupported architecture: {}",
                    std::env::consts::ARCH
                ))
            })?;
            let executable = provisioner.provision(platform)?;
            std::fs::create_dir_all(&work_dir)?;
            let path = artifact.write_artifact(&work_dir)?;
            log::debug!("Worker config written to {}", path.display());
            Ok::<_, MinerError>(executable)
        })
        .await??;

        log::debug!(
            "Spawning {} {}",
            executable.display(),
            invocation.args().join(" ")
        );
        Command::new(&executable)
            .args(invocation.args())
            .current_dir(&self.shared.settings.work_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(MinerError::SpawnFailed)
    }
}

/// Forwards every line of one output stream into the merged line channel
///
/// Invalid UTF-8 is replaced rather than treated as a stream error.
async fn pump_lines<R>(stream: R, tx: mpsc::UnboundedSender<String>)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                let line = line.trim_end_matches(['\r', '\n']);
                if tx.send(line.to_string()).is_err() {
                    break;
                }
            }
            Err(e) => {
                log::warn!("Error reading worker output: {}", e);
                break;
            }
        }
    }
}

/// Reader task: parses merged worker output in order until it ends
async fn read_output(shared: Weak<Shared>, epoch: u64, mut lines: mpsc::UnboundedReceiver<String>) {
    while let Some(line) = lines.recv().await {
        log::debug!("Worker: {}", line);
        let event = parse_line(&line);
        let Some(live) = shared.upgrade() else {
            return;
        };
        if !live.apply(epoch, &event) {
            return;
        }
    }

    if let Some(live) = shared.upgrade() {
        live.worker_exited(epoch).await;
    }
}

/// Tick task: refreshes uptime and temperature until the run is over
async fn tick_loop(shared: Weak<Shared>, epoch: u64, period: Duration) {
    let mut interval = time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut components: Option<Components> = None;

    loop {
        interval.tick().await;
        let cached = components.take();
        // sysfs reads block
        let temperature = match tokio::task::spawn_blocking(move || {
            let mut components = cached.unwrap_or_else(Components::new_with_refreshed_list);
            let temperature = cpu_temperature(&mut components);
            (components, temperature)
        })
        .await
        {
            Ok((sampled, temperature)) => {
                components = Some(sampled);
                temperature
            }
            Err(e) => {
                log::warn!("Temperature sampling failed: {}", e);
                None
            }
        };
        let Some(live) = shared.upgrade() else {
            return;
        };
        match live.tick(epoch, Instant::now(), temperature) {
            Some(snapshot) => live.settings.notifier.notify(&snapshot),
            None => return,
        }
    }
}

fn cpu_temperature(components: &mut Components) -> Option<f32> {
    components.refresh(true);
    components
        .iter()
        .find(|c| {
            let label = c.label().to_lowercase();
            label.contains("cpu") || label.contains("package") || label.contains("tctl")
        })
        .and_then(|c| c.temperature())
}
