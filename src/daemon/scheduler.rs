//! Daily trigger scheduling.
//!
//! One control loop waits on two events, the countdown to the next trigger
//! and shutdown, and reacts to whichever comes first. The loop itself never
//! performs blocking I/O: each firing spawns the backup run and the
//! retention sweep as independent tasks on the shared tracker and re-arms.

use crate::config::{Config, TimeOfDay};
use crate::{retention, run};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::info;

pub struct Scheduler {
    config: Arc<Config>,
    tracker: TaskTracker,
    cancel: CancellationToken,
}

impl Scheduler {
    pub fn new(config: Arc<Config>, tracker: TaskTracker, cancel: CancellationToken) -> Self {
        Self {
            config,
            tracker,
            cancel,
        }
    }

    /// Control loop. Runs until the cancellation token fires; work already
    /// spawned on the tracker is unaffected and runs to completion.
    pub async fn run(self) {
        let mut next = next_trigger(Utc::now(), self.config.schedule.time_of_day);
        info!(
            time_of_day = %self.config.schedule.time_of_day,
            first_run = %next,
            "Daily backup scheduled"
        );

        loop {
            tokio::select! {
                // Shutdown wins over a simultaneously expiring timer: once a
                // signal has arrived, no new run may start.
                biased;

                _ = self.cancel.cancelled() => {
                    info!("Scheduler stopped, no further backups will be armed");
                    return;
                }
                _ = tokio::time::sleep(until(next)) => {
                    self.fire(next);
                    // Fixed 24h cadence: advanced from the previous instant,
                    // never recomputed from the wall clock. A run slower than
                    // 24h overlaps the next one; each uses its own snapshot
                    // directory.
                    next += Duration::hours(24);
                }
            }
        }
    }

    /// Spawn one backup run and one retention sweep for `instant`.
    fn fire(&self, instant: DateTime<Utc>) {
        self.tracker
            .spawn(run::run(self.config.clone(), instant));
        self.tracker
            .spawn(retention::run(self.config.clone(), instant));
    }
}

/// Next trigger instant: today at `time_of_day` UTC, rolled forward by 24
/// hours if that moment is not strictly in the future.
pub fn next_trigger(now: DateTime<Utc>, time_of_day: TimeOfDay) -> DateTime<Utc> {
    let candidate = now
        .date_naive()
        .and_hms_opt(u32::from(time_of_day.hour), u32::from(time_of_day.minute), 0)
        .expect("time of day validated at configuration load")
        .and_utc();

    if candidate > now {
        candidate
    } else {
        candidate + Duration::hours(24)
    }
}

fn until(instant: DateTime<Utc>) -> std::time::Duration {
    (instant - Utc::now())
        .to_std()
        .unwrap_or(std::time::Duration::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn next_trigger_is_strictly_future_and_within_a_day() {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 13, 37, 11).unwrap();

        for hour in 0..24u8 {
            for minute in 0..60u8 {
                let next = next_trigger(now, TimeOfDay { hour, minute });
                assert!(next > now, "{:02}:{:02} not in the future", hour, minute);
                assert!(
                    next - now <= Duration::hours(24),
                    "{:02}:{:02} more than a day ahead",
                    hour,
                    minute
                );
            }
        }
    }

    #[test]
    fn time_later_today_fires_today() {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
        let next = next_trigger(now, TimeOfDay { hour: 13, minute: 0 });
        assert_eq!(next, Utc.with_ymd_and_hms(2024, 6, 15, 13, 0, 0).unwrap());
    }

    #[test]
    fn time_already_passed_rolls_to_tomorrow() {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
        let next = next_trigger(now, TimeOfDay { hour: 11, minute: 0 });
        assert_eq!(next, Utc.with_ymd_and_hms(2024, 6, 16, 11, 0, 0).unwrap());
    }

    #[test]
    fn exact_current_minute_rolls_to_tomorrow() {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
        let next = next_trigger(now, TimeOfDay { hour: 12, minute: 0 });
        assert_eq!(next, Utc.with_ymd_and_hms(2024, 6, 16, 12, 0, 0).unwrap());
    }

    #[tokio::test]
    async fn firing_spawns_backup_and_sweep() -> std::io::Result<()> {
        let volumes = TempDir::new()?;
        let archives = TempDir::new()?;
        fs::create_dir(volumes.path().join("vol"))?;
        fs::write(volumes.path().join("vol/file.txt"), b"data")?;

        let mut config = Config::default();
        config.storage.volumes_root = volumes.path().to_path_buf();
        config.storage.archive_root = archives.path().to_path_buf();

        let tracker = TaskTracker::new();
        let scheduler = Scheduler::new(
            Arc::new(config),
            tracker.clone(),
            CancellationToken::new(),
        );

        let instant = Utc::now();
        scheduler.fire(instant);
        tracker.close();
        tracker.wait().await;

        let snapshot_dir = archives
            .path()
            .join(crate::snapshot::directory_name(instant));
        assert!(snapshot_dir.join("vol.tar.zst").exists());

        Ok(())
    }

    #[tokio::test]
    async fn loop_exits_on_cancellation() {
        let tracker = TaskTracker::new();
        let cancel = CancellationToken::new();
        let scheduler = Scheduler::new(Arc::new(Config::default()), tracker, cancel.clone());

        let handle = tokio::spawn(scheduler.run());
        cancel.cancel();

        tokio::time::timeout(std::time::Duration::from_secs(1), handle)
            .await
            .expect("scheduler did not stop on cancellation")
            .unwrap();
    }
}
