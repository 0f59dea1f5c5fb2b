use std::{
    fs, io,
    path::{Path, PathBuf},
};

use crate::error::{ReleaseError, Result};

/// Regular files directly inside `dir` accepted by `keep`, sorted by path.
///
/// A missing directory yields an empty list.
fn regular_files<F>(dir: &Path, keep: F) -> Result<Vec<PathBuf>>
where
    F: Fn(&str) -> bool,
{
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err.into()),
    };

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry?;
        if entry.file_type()?.is_file() && keep(&entry.file_name().to_string_lossy()) {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

/// Collect distribution files in `dir` whose names start with `prefix`.
///
/// Results are sorted by file name. A missing directory, or one with no
/// matching regular files, yields [`ReleaseError::NoArtifacts`].
pub fn collect_artifacts(dir: &Path, prefix: &str) -> Result<Vec<PathBuf>> {
    let artifacts = regular_files(dir, |name| name.starts_with(prefix))?;
    if artifacts.is_empty() {
        return Err(ReleaseError::NoArtifacts {
            dir: dir.to_path_buf(),
            prefix: prefix.to_string(),
        });
    }
    Ok(artifacts)
}

/// Every regular file in the output directory `dir`, sorted by file name.
pub fn output_files(dir: &Path) -> Result<Vec<PathBuf>> {
    regular_files(dir, |_| true)
}
