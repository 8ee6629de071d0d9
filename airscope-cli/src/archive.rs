//! Keeping capture files that contain handshake frames

use airscope_core::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// First free path for `file_name` in `dir`
///
/// `dump.pcap` becomes `dump-1.pcap`, `dump-2.pcap`, ... when taken.
pub fn incremental_path(dir: &Path, file_name: &str) -> PathBuf {
    let candidate = dir.join(file_name);
    if !candidate.exists() {
        return candidate;
    }

    let (stem, extension) = match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (file_name, None),
    };
    (1u32..)
        .map(|n| match extension {
            Some(ext) => dir.join(format!("{}-{}.{}", stem, n, ext)),
            None => dir.join(format!("{}-{}", stem, n)),
        })
        .find(|path| !path.exists())
        .unwrap_or(candidate)
}

/// Copy a capture file into `dir` without overwriting anything
pub fn archive_capture(file: &Path, dir: &Path) -> Result<PathBuf> {
    let file_name = file
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| Error::invalid_config("file", "capture path has no file name"))?;

    fs::create_dir_all(dir)?;
    let destination = incremental_path(dir, file_name);
    fs::copy(file, &destination)?;

    info!(
        src = %file.display(),
        dest = %destination.display(),
        "Copied capture file with possible handshake"
    );
    Ok(destination)
}
