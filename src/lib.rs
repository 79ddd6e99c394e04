//! Volback library
//!
//! Daily backup daemon: archives registered data volumes into timestamped,
//! zstd-compressed snapshots and prunes snapshots past the retention window.

pub mod archive;
pub mod config;
pub mod daemon;
pub mod registry;
pub mod retention;
pub mod run;
pub mod snapshot;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use utils::errors::BackupError;
pub type Result<T> = std::result::Result<T, BackupError>;
