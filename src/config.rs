//! Configuration management for the backup daemon.
//!
//! Loads configuration from a TOML file; individual values can be overridden
//! by CLI flags. An out-of-range `time_of_day` is rejected while loading, so
//! a bad schedule is fatal before the scheduler loop ever starts.

use crate::utils::errors::BackupError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Wall-clock time of day (UTC) at which the daily backup fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeOfDay {
    pub hour: u8,
    pub minute: u8,
}

impl FromStr for TimeOfDay {
    type Err = BackupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (hour, minute) = s
            .split_once(':')
            .ok_or_else(|| BackupError::Config(format!("invalid time '{}', expected hh:mm", s)))?;

        let hour: u8 = hour
            .parse()
            .map_err(|_| BackupError::Config(format!("invalid hour in '{}'", s)))?;
        let minute: u8 = minute
            .parse()
            .map_err(|_| BackupError::Config(format!("invalid minute in '{}'", s)))?;

        if hour > 23 || minute > 59 {
            return Err(BackupError::Config(format!(
                "time '{}' out of range (hour 0-23, minute 0-59)",
                s
            )));
        }

        Ok(Self { hour, minute })
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub schedule: ScheduleConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// UTC time at which to perform the daily backup
    #[serde(default = "default_time_of_day")]
    pub time_of_day: TimeOfDay,

    /// Snapshots older than this many days are deleted
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,

    /// Archives larger than this many MiB are logged at warn level
    #[serde(default = "default_size_warning_threshold_mb")]
    pub size_warning_threshold_mb: u64,

    /// Concurrent per-volume archive tasks within one run
    #[serde(default = "default_max_concurrent_archives")]
    pub max_concurrent_archives: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root whose immediate subdirectories are the registered volumes
    #[serde(default = "default_volumes_root")]
    pub volumes_root: PathBuf,

    /// Root under which timestamped snapshot directories are created
    #[serde(default = "default_archive_root")]
    pub archive_root: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default values
fn default_time_of_day() -> TimeOfDay {
    TimeOfDay { hour: 1, minute: 0 }
}

fn default_retention_days() -> u32 {
    14
}

fn default_size_warning_threshold_mb() -> u64 {
    100
}

fn default_max_concurrent_archives() -> usize {
    1
}

fn default_volumes_root() -> PathBuf {
    PathBuf::from("./volumes")
}

fn default_archive_root() -> PathBuf {
    PathBuf::from("./data")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            time_of_day: default_time_of_day(),
            retention_days: default_retention_days(),
            size_warning_threshold_mb: default_size_warning_threshold_mb(),
            max_concurrent_archives: default_max_concurrent_archives(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            volumes_root: default_volumes_root(),
            archive_root: default_archive_root(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schedule: ScheduleConfig::default(),
            storage: StorageConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}
