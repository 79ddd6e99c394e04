//! Volback - Main entry point
//!
//! Daily backup daemon: archives registered data volumes into timestamped,
//! zstd-compressed snapshots and prunes snapshots past the retention window.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use volback::config::{Config, TimeOfDay};
use volback::daemon::scheduler::Scheduler;
use volback::daemon::shutdown::ShutdownCoordinator;
use volback::utils;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// UTC time of day for the daily backup, in the format hh:mm
    #[arg(short, long)]
    time_of_day: Option<TimeOfDay>,

    /// Snapshots older than this many days are deleted
    #[arg(short, long)]
    retention_days: Option<u32>,

    /// Archives larger than this many MiB are logged at warn level
    #[arg(long)]
    size_warning_threshold_mb: Option<u64>,

    /// Concurrent per-volume archive tasks within one run
    #[arg(long)]
    max_concurrent_archives: Option<usize>,

    /// Directory whose immediate subdirectories are the volumes to back up
    #[arg(long)]
    volumes_root: Option<PathBuf>,

    /// Directory receiving the timestamped snapshot directories
    #[arg(long)]
    archive_root: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,
}

impl Args {
    fn apply_to(self, config: &mut Config) {
        if let Some(time_of_day) = self.time_of_day {
            config.schedule.time_of_day = time_of_day;
        }
        if let Some(retention_days) = self.retention_days {
            config.schedule.retention_days = retention_days;
        }
        if let Some(threshold) = self.size_warning_threshold_mb {
            config.schedule.size_warning_threshold_mb = threshold;
        }
        if let Some(limit) = self.max_concurrent_archives {
            config.schedule.max_concurrent_archives = limit;
        }
        if let Some(volumes_root) = self.volumes_root {
            config.storage.volumes_root = volumes_root;
        }
        if let Some(archive_root) = self.archive_root {
            config.storage.archive_root = archive_root;
        }
        if let Some(log_level) = self.log_level {
            config.log.level = log_level;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration; a bad schedule is fatal here, before the loop.
    let mut config = if let Some(config_path) = &args.config {
        Config::from_file(config_path)?
    } else {
        Config::default()
    };
    args.apply_to(&mut config);

    // Initialize logging
    utils::logger::init(&config.log.level)?;

    tracing::info!(
        "Starting volback v{} (volumes: {}, archives: {})",
        env!("CARGO_PKG_VERSION"),
        config.storage.volumes_root.display(),
        config.storage.archive_root.display()
    );

    // The archive root is ours; the volumes root belongs to the operator and
    // is only read, once per run.
    std::fs::create_dir_all(&config.storage.archive_root)?;

    let config = Arc::new(config);
    let shutdown_coordinator = ShutdownCoordinator::new();

    let scheduler = Scheduler::new(
        config.clone(),
        shutdown_coordinator.tracker().clone(),
        shutdown_coordinator.cancel_token(),
    );
    let scheduler_handle = tokio::spawn(scheduler.run());

    // Wait for shutdown signal
    shutdown_coordinator.wait_for_signal().await;

    // The loop stops arming; everything already in flight finishes.
    if let Err(e) = scheduler_handle.await {
        tracing::error!("Scheduler task panicked: {}", e);
    }
    shutdown_coordinator.drain().await;

    tracing::info!("Exit");
    Ok(())
}
