//! Frame source enumeration.
//!
//! Frames are files named `<number>.<ext>` (for example `0001.jpg` or `17.jpg`)
//! in a single directory. Playback order is the numeric value of that prefix,
//! so `10.jpg` comes after `9.jpg` whether or not the names are zero-padded.

use std::io;
use std::path::{Path, PathBuf};

use log::debug;
use walkdir::WalkDir;

use crate::error::{PlayError, Result};

/// Parses the numeric prefix of a frame file name (everything before the first `.`).
pub fn frame_number(name: &str) -> Result<u64> {
    let prefix = name.split('.').next().unwrap_or(name);
    prefix.parse::<u64>().map_err(|source| PlayError::FrameName { name: name.to_string(), source })
}

/// Orders `(file name, item)` pairs by the numeric prefix of the name and
/// returns the items. Equal numbers keep their incoming order.
pub fn order_by_frame_number<T>(entries: Vec<(String, T)>) -> Result<Vec<T>> {
    let mut keyed = entries
        .into_iter()
        .map(|(name, item)| frame_number(&name).map(|n| (n, item)))
        .collect::<Result<Vec<_>>>()?;
    keyed.sort_by_key(|(n, _)| *n);
    Ok(keyed.into_iter().map(|(_, item)| item).collect())
}

/// Lists the frame files directly inside `dir` whose extension matches
/// `extension` (case-insensitive), in playback order.
pub fn find_frame_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let enumeration = |source: io::Error| PlayError::Enumeration { path: dir.to_path_buf(), source };

    if !dir.is_dir() {
        return Err(enumeration(io::Error::new(io::ErrorKind::NotFound, "not a directory")));
    }

    let mut entries = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| enumeration(e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let matches = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case(extension))
            .unwrap_or(false);
        if !matches {
            continue;
        }
        // Names that are not valid UTF-8 are reported under their lossy form;
        // the path itself is kept as found so it still opens.
        let name = entry.file_name().to_string_lossy().into_owned();
        entries.push((name, path.to_path_buf()));
    }

    let ordered = order_by_frame_number(entries)?;
    debug!("found {} .{} frames in {}", ordered.len(), extension, dir.display());
    Ok(ordered)
}
