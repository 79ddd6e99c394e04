//! Retention pruning.
//!
//! Deletes snapshot directories older than the retention window. Directory
//! names are parsed back into their trigger instants and compared as
//! timestamps rather than as raw strings; names that do not parse are left
//! alone so an operator's stray directory is never deleted.

use crate::config::Config;
use crate::snapshot;
use crate::Result;
use chrono::{DateTime, Duration, Utc};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};

/// Outcome of one retention sweep.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepSummary {
    pub removed: usize,
    pub failed: usize,
}

/// Task entry point for one scheduled sweep. Errors are absorbed here and
/// converted to log output; they never propagate past the task boundary.
///
/// `now` is the run's trigger instant, so a snapshot created by the
/// concurrently running backup (named for that same instant) can never be
/// strictly older than the threshold, for any retention window.
pub async fn run(config: Arc<Config>, now: DateTime<Utc>) {
    let retention_days = config.schedule.retention_days;
    info!(retention_days, "Removing any backup older than the retention window");

    let archive_root = config.storage.archive_root.clone();
    let outcome =
        tokio::task::spawn_blocking(move || sweep(&archive_root, retention_days, now)).await;

    match outcome {
        Ok(Ok(summary)) if summary.removed == 0 && summary.failed == 0 => {
            info!("No backup needs removal");
        }
        Ok(Ok(summary)) => {
            info!(
                removed = summary.removed,
                failed = summary.failed,
                "Retention sweep completed"
            );
        }
        Ok(Err(e)) => error!(error = %e, "Retention sweep failed"),
        Err(e) => error!(error = %e, "Retention sweep task panicked"),
    }
}

/// Delete every snapshot directory strictly older than
/// `now - retention_days`. Individual deletion failures are counted and do
/// not stop the sweep; an unreadable archive root aborts it with no
/// deletions.
pub fn sweep(archive_root: &Path, retention_days: u32, now: DateTime<Utc>) -> Result<SweepSummary> {
    let threshold = now - Duration::days(i64::from(retention_days));
    let mut summary = SweepSummary::default();

    for entry in fs::read_dir(archive_root)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().into_owned();
        let Some(instant) = snapshot::parse_directory_name(&name) else {
            continue;
        };
        if instant >= threshold {
            continue;
        }

        match fs::remove_dir_all(entry.path()) {
            Ok(()) => {
                summary.removed += 1;
                info!(snapshot = %name, "Removed expired snapshot");
            }
            Err(e) => {
                summary.failed += 1;
                error!(snapshot = %name, error = %e, "Failed to remove expired snapshot");
            }
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn snapshot_dir(root: &Path, instant: DateTime<Utc>) -> std::path::PathBuf {
        let dir = root.join(snapshot::directory_name(instant));
        fs::create_dir(&dir).unwrap();
        dir
    }

    #[test]
    fn removes_only_snapshots_past_the_window() -> std::io::Result<()> {
        let root = TempDir::new()?;
        let now = Utc::now();

        let d20 = snapshot_dir(root.path(), now - Duration::days(20));
        let d10 = snapshot_dir(root.path(), now - Duration::days(10));
        let d1 = snapshot_dir(root.path(), now - Duration::days(1));

        let summary = sweep(root.path(), 14, now).unwrap();
        assert_eq!(summary, SweepSummary { removed: 1, failed: 0 });
        assert!(!d20.exists());
        assert!(d10.exists());
        assert!(d1.exists());

        Ok(())
    }

    #[test]
    fn fresh_snapshot_survives_zero_day_retention() -> std::io::Result<()> {
        let root = TempDir::new()?;
        let now = Utc::now();

        let fresh = snapshot_dir(root.path(), now);
        let old = snapshot_dir(root.path(), now - Duration::days(3));

        let summary = sweep(root.path(), 0, now).unwrap();
        assert_eq!(summary, SweepSummary { removed: 1, failed: 0 });
        assert!(fresh.exists());
        assert!(!old.exists());

        Ok(())
    }

    #[test]
    fn leaves_foreign_entries_alone() -> std::io::Result<()> {
        let root = TempDir::new()?;
        let now = Utc::now();

        fs::create_dir(root.path().join("lost+found"))?;
        fs::write(root.path().join("README"), b"operator notes")?;

        let summary = sweep(root.path(), 0, now).unwrap();
        assert_eq!(summary, SweepSummary { removed: 0, failed: 0 });
        assert!(root.path().join("lost+found").exists());
        assert!(root.path().join("README").exists());

        Ok(())
    }

    #[test]
    fn unreadable_root_is_fatal_for_the_sweep() {
        let missing = Path::new("/nonexistent/volback-test-archive");
        assert!(sweep(missing, 14, Utc::now()).is_err());
    }
}
