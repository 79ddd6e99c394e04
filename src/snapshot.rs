//! Snapshot directory naming.
//!
//! Snapshot directories are named by their run's trigger instant in a
//! fixed-width UTC format. The format is part of the on-disk contract:
//! lexicographic order of directory names must match chronological order,
//! and it must never change for the lifetime of deployed data.

use chrono::{DateTime, NaiveDateTime, Utc};

/// On-disk timestamp format for snapshot directory names.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Directory name for a snapshot triggered at `instant`.
pub fn directory_name(instant: DateTime<Utc>) -> String {
    instant.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a snapshot directory name back into its trigger instant.
///
/// Returns `None` for names that were not produced by [`directory_name`],
/// so stray directories under the archive root are never touched.
pub fn parse_directory_name(name: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(name, TIMESTAMP_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn round_trips_an_instant() {
        let instant = Utc.with_ymd_and_hms(2024, 3, 9, 1, 30, 0).unwrap();
        let name = directory_name(instant);
        assert_eq!(name, "2024-03-09T01:30:00Z");
        assert_eq!(parse_directory_name(&name), Some(instant));
    }

    #[test]
    fn rejects_foreign_names() {
        assert_eq!(parse_directory_name("lost+found"), None);
        assert_eq!(parse_directory_name("2024-03-09"), None);
        assert_eq!(parse_directory_name(""), None);
    }

    #[test]
    fn lexicographic_order_matches_chronological_order() {
        let a = Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 59).unwrap();
        let b = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let c = Utc.with_ymd_and_hms(2024, 10, 2, 5, 0, 0).unwrap();

        let mut names = vec![directory_name(c), directory_name(a), directory_name(b)];
        names.sort();
        assert_eq!(
            names,
            vec![directory_name(a), directory_name(b), directory_name(c)]
        );
    }
}
