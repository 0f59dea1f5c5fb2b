use std::{
    fs, io,
    path::{Path, PathBuf},
};

use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use crate::error::Result;

/// What the clean step is allowed to delete.
#[derive(Debug, Clone)]
pub struct CleanTargets<'a> {
    /// Build-cache directory relative to the root.
    pub build_dir: &'a Path,
    /// Artifact output directory relative to the root.
    pub output_dir: &'a Path,
    /// Directory-name suffix marking generated package metadata (`.egg-info`).
    pub metadata_suffix: &'a str,
    /// Directory names that are never descended into (virtual environments).
    pub skip_dirs: &'a [String],
}

/// Paths removed by a clean run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CleanReport {
    /// Directories that existed and were deleted, in removal order.
    pub removed: Vec<PathBuf>,
}

/// Remove a directory tree, treating an already-absent path as success.
fn remove_dir_if_present(path: &Path) -> io::Result<bool> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err),
    }
}

/// Whether the walker should look inside `entry`.
fn should_descend(entry: &DirEntry, skip_dirs: &[String]) -> bool {
    if entry.depth() == 0 {
        return true;
    }
    if !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    !name.starts_with('.') && !skip_dirs.iter().any(|skip| *skip == name)
}

/// Delete previous build output under `root`.
///
/// Removes the build and output directories, then every directory whose name
/// ends with the metadata suffix anywhere below `root`. Hidden directories
/// and the configured skip list (virtual environments) are not searched.
pub fn clean(root: &Path, targets: &CleanTargets<'_>) -> Result<CleanReport> {
    let mut report = CleanReport::default();

    for dir in [targets.build_dir, targets.output_dir] {
        let path = root.join(dir);
        if remove_dir_if_present(&path)? {
            debug!(path = %path.display(), "removed");
            report.removed.push(path);
        }
    }

    let mut matches = Vec::new();
    let mut walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| should_descend(entry, targets.skip_dirs));
    while let Some(entry) = walker.next() {
        let entry = match entry {
            Ok(entry) => entry,
            // Raced with something else deleting the tree.
            Err(err) if err.io_error().map(io::Error::kind) == Some(io::ErrorKind::NotFound) => {
                continue;
            }
            Err(err) => return Err(io::Error::other(err).into()),
        };
        if entry.depth() > 0
            && entry
                .file_name()
                .to_string_lossy()
                .ends_with(targets.metadata_suffix)
        {
            matches.push(entry.into_path());
            walker.skip_current_dir();
        }
    }

    for path in matches {
        if remove_dir_if_present(&path)? {
            debug!(path = %path.display(), "removed");
            report.removed.push(path);
        }
    }

    Ok(report)
}
