// src/main.rs
use clap::Parser;
use std::sync::Arc;
use verus_miner_rs::cli::{Action, ConfigOptions, SetOptions, StartOptions};
use verus_miner_rs::config::{self, ConfigStore, DEFAULT_POOLS};
use verus_miner_rs::stats::notifier::status_line;
use verus_miner_rs::utils::logging::{init_logging, init_verbose_logging};
use verus_miner_rs::{BundledProvisioner, Commands, MinerError, ProcessSupervisor};

/// Main entry point for the miner supervisor
///
/// # Returns
/// - `Ok(())` on successful execution
/// - `Err(MinerError)` if any operation fails
fn main() -> Result<(), MinerError> {
    let cli = Commands::parse();

    if cli.verbose {
        init_verbose_logging();
    } else {
        init_logging();
    }

    match cli.action {
        Action::Start(opts) => run_async(start_mining(opts)),
        Action::Config(opts) => generate_config(opts),
        Action::Set(opts) => run_async(save_settings(opts)),
        Action::Pools => {
            list_pools();
            Ok(())
        }
    }
}

fn run_async<F>(fut: F) -> Result<(), MinerError>
where
    F: std::future::Future<Output = Result<(), MinerError>>,
{
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(fut)
}

/// Starts the worker and reports statistics until Ctrl-C or worker exit
///
/// # Operations
/// 1. Loads the stored configuration and applies CLI overrides
/// 2. Starts the supervised worker
/// 3. Logs every state change it publishes (and prints it as JSON with `--json`)
/// 4. Stops the worker on Ctrl-C
async fn start_mining(opts: StartOptions) -> Result<(), MinerError> {
    let store = ConfigStore::open(&opts.config).await?;
    let mut config = store.current();
    if let Some(wallet) = opts.wallet {
        config.wallet_address = wallet;
    }
    if let Some(pool) = opts.pool {
        config.pool_url = pool;
    }
    if let Some(worker) = opts.worker {
        config.worker_name = worker;
    }
    if let Some(threads) = opts.threads {
        config.cpu_threads = threads;
    }

    let provisioner = BundledProvisioner::new(&opts.assets, &opts.work_dir, opts.binary);
    let mut supervisor = ProcessSupervisor::new(Arc::new(provisioner), &opts.work_dir);
    if let Some(platform) = opts.platform {
        supervisor = supervisor.with_platform(platform);
    }

    supervisor.start(config).await?;
    let mut updates = supervisor.subscribe();

    loop {
        tokio::select! {
            update = updates.recv() => {
                if opts.json {
                    if let Some(snapshot) = &update {
                        println!("{}", serde_json::to_string(snapshot)?);
                    }
                }
                match update {
                    Some(snapshot) if snapshot.running => {
                        log::debug!("{}", status_line(&snapshot));
                    }
                    Some(_) => {
                        log::info!("Worker is no longer running, exiting");
                        break;
                    }
                    None => break,
                }
            }
            _ = tokio::signal::ctrl_c() => {
                log::info!("Interrupted, stopping worker");
                supervisor.stop();
                break;
            }
        }
    }

    Ok(())
}

/// Writes the configuration template to the requested file
fn generate_config(opts: ConfigOptions) -> Result<(), MinerError> {
    std::fs::write(&opts.output, config::generate_template())?;
    log::info!("Configuration template written to {}", opts.output.display());
    Ok(())
}

/// Persists the settings given on the command line
async fn save_settings(opts: SetOptions) -> Result<(), MinerError> {
    let store = ConfigStore::open(&opts.config).await?;
    let fields = opts.fields;

    if let Some(wallet) = fields.wallet {
        store.save_wallet_address(&wallet).await?;
    }
    if let Some(pool) = fields.pool {
        store.save_pool_url(&pool).await?;
    }
    if let Some(worker) = fields.worker {
        store.save_worker_name(&worker).await?;
    }
    if let Some(threads) = fields.threads {
        store.save_cpu_threads(threads).await?;
    }

    log::info!("Saved settings to {}", store.path().display());
    Ok(())
}

fn list_pools() {
    for pool in &DEFAULT_POOLS {
        println!(
            "{:<12} {:<22} {}",
            pool.name,
            pool.full_address(),
            pool.region
        );
    }
}
