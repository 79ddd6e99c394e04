//! Volume registry snapshot.
//!
//! The registry itself is external: every immediate subdirectory of the
//! volumes root is one registered volume. A run takes an immutable snapshot
//! of that listing once at start, so registry changes made while a run is in
//! flight never affect it.

use crate::Result;
use std::fs;
use std::path::{Path, PathBuf};

/// One registered volume, captured at run start.
#[derive(Debug, Clone)]
pub struct Volume {
    pub name: String,
    pub path: PathBuf,
}

/// List the registered volumes, sorted by name for a deterministic
/// processing order. Non-directory entries under the root are ignored.
pub fn snapshot(volumes_root: &Path) -> Result<Vec<Volume>> {
    let mut volumes = Vec::new();

    for entry in fs::read_dir(volumes_root)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        volumes.push(Volume {
            name: entry.file_name().to_string_lossy().into_owned(),
            path: entry.path(),
        });
    }

    volumes.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(volumes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn lists_only_directories_sorted_by_name() -> std::io::Result<()> {
        let root = TempDir::new()?;
        fs::create_dir(root.path().join("postgres"))?;
        fs::create_dir(root.path().join("grafana"))?;
        fs::write(root.path().join("notes.txt"), b"not a volume")?;

        let volumes = snapshot(root.path()).unwrap();
        let names: Vec<_> = volumes.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["grafana", "postgres"]);

        Ok(())
    }

    #[test]
    fn empty_root_yields_empty_snapshot() -> std::io::Result<()> {
        let root = TempDir::new()?;
        let volumes = snapshot(root.path()).unwrap();
        assert!(volumes.is_empty());
        Ok(())
    }

    #[test]
    fn missing_root_is_an_error() {
        let missing = Path::new("/nonexistent/volback-test-volumes");
        assert!(snapshot(missing).is_err());
    }
}
