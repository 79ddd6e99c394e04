//! Volume archiving.
//!
//! One volume becomes one `.tar.zst` file: every regular file in the
//! volume's tree is stored under its volume-root-relative path, so the
//! archive is self-contained and portable. Directories produce no entries.
//! Compression uses zstd at maximum level; runs are once-daily and
//! I/O-bound, so the CPU cost is acceptable.

use crate::Result;
use std::fs::File;
use std::path::Path;
use walkdir::WalkDir;

/// zstd maximum regular compression level.
const COMPRESSION_LEVEL: i32 = 19;

/// Archive one volume into `destination`, returning the compressed size in
/// bytes. On any walk or write error the partial destination file is
/// removed; a half-written container would only confuse a future restore.
pub fn archive_volume(volume_root: &Path, destination: &Path) -> Result<u64> {
    match write_archive(volume_root, destination) {
        Ok(bytes) => Ok(bytes),
        Err(e) => {
            let _ = std::fs::remove_file(destination);
            Err(e)
        }
    }
}

fn write_archive(volume_root: &Path, destination: &Path) -> Result<u64> {
    let file = File::create(destination)?;
    let encoder = zstd::Encoder::new(file, COMPRESSION_LEVEL)?;
    let mut builder = tar::Builder::new(encoder);

    // Sorted walk order keeps entry sequences identical across runs over
    // identical trees. Symlinks are not followed and not stored.
    for entry in WalkDir::new(volume_root).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry.path().strip_prefix(volume_root).unwrap_or(entry.path());
        let mut source = File::open(entry.path())?;
        builder.append_file(relative, &mut source)?;
    }

    // Finalize container footer and compression frame before reporting size.
    let encoder = builder.into_inner()?;
    let file = encoder.finish()?;
    Ok(file.metadata()?.len())
}
