//! One scheduled backup run.
//!
//! A run snapshots the volume registry, creates the dated snapshot
//! directory, and archives every volume into it. One volume's failure is
//! isolated: it is logged and counted, and the remaining volumes still get
//! archived. Only the registry listing and the snapshot directory creation
//! are fatal to the run, since nothing can proceed without them.

use crate::archive;
use crate::config::Config;
use crate::registry::{self, Volume};
use crate::snapshot;
use crate::Result;
use chrono::{DateTime, Utc};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

/// Outcome of one backup run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub volumes: usize,
    pub archived: usize,
    pub errors: usize,
}

/// Task entry point for one scheduled run. Errors are absorbed here and
/// converted to log output; they never propagate past the task boundary.
pub async fn run(config: Arc<Config>, instant: DateTime<Utc>) {
    let name = snapshot::directory_name(instant);
    info!(snapshot = %name, "Starting backup");

    match execute(&config, instant).await {
        Ok(summary) if summary.volumes == 0 => {
            warn!(snapshot = %name, "No volume found");
        }
        Ok(summary) if summary.errors > 0 => {
            warn!(
                snapshot = %name,
                archived = summary.archived,
                errors = summary.errors,
                "Backup completed with errors"
            );
        }
        Ok(summary) => {
            info!(snapshot = %name, archived = summary.archived, "Backup completed");
        }
        Err(e) => error!(snapshot = %name, error = %e, "Backup run failed"),
    }
}

/// Execute one run against the registry and archive root from `config`.
pub async fn execute(config: &Config, instant: DateTime<Utc>) -> Result<RunSummary> {
    let volumes = registry::snapshot(&config.storage.volumes_root)?;

    let snapshot_dir = config
        .storage
        .archive_root
        .join(snapshot::directory_name(instant));
    std::fs::create_dir(&snapshot_dir)?;

    archive_volumes(config, volumes, &snapshot_dir).await
}

/// Archive each volume into `snapshot_dir`, at most
/// `max_concurrent_archives` at a time. Archiving is blocking I/O and runs
/// on the blocking thread pool; a permit is taken before spawning so the
/// number of in-flight archive tasks stays bounded.
async fn archive_volumes(
    config: &Config,
    volumes: Vec<Volume>,
    snapshot_dir: &Path,
) -> Result<RunSummary> {
    let mut summary = RunSummary {
        volumes: volumes.len(),
        ..RunSummary::default()
    };

    let limit = config.schedule.max_concurrent_archives.max(1);
    let semaphore = Arc::new(Semaphore::new(limit));
    let mut tasks: JoinSet<(String, Result<u64>)> = JoinSet::new();

    for volume in volumes {
        let permit = semaphore
            .clone()
            .acquire_owned()
            .await
            .expect("archive semaphore closed");

        let destination = snapshot_dir.join(format!("{}.tar.zst", volume.name));
        tasks.spawn_blocking(move || {
            let _permit = permit;
            let result = archive::archive_volume(&volume.path, &destination);
            (volume.name, result)
        });
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((name, Ok(bytes))) => {
                summary.archived += 1;
                log_archive_size(&name, bytes, config.schedule.size_warning_threshold_mb);
            }
            Ok((name, Err(e))) => {
                summary.errors += 1;
                error!(volume = %name, error = %e, "Volume archive failed");
            }
            Err(e) => {
                summary.errors += 1;
                error!(error = %e, "Volume archive task panicked");
            }
        }
    }

    Ok(summary)
}

fn log_archive_size(volume: &str, bytes: u64, threshold_mb: u64) {
    let size_mb = bytes / (1024 * 1024);
    if size_mb > threshold_mb {
        warn!(volume, size_mb, "Archive size exceeds warning threshold");
    } else {
        info!(volume, size_mb, "Volume archived");
    }
}
