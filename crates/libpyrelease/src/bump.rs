//! Patch-level version bumping of a project metadata file.

use std::{fs, path::Path};

use tracing::info;

use crate::{
    error::{ReleaseError, Result},
    git::Git,
    version::{self, Version},
};

/// Read the metadata file, mapping a missing file to [`ReleaseError::NotFound`].
fn read_metadata(metadata_path: &Path) -> Result<String> {
    if !metadata_path.is_file() {
        return Err(ReleaseError::NotFound {
            path: metadata_path.to_path_buf(),
        });
    }
    Ok(fs::read_to_string(metadata_path)?)
}

/// Error for a metadata file that carries no version line.
fn missing_version(metadata_path: &Path) -> ReleaseError {
    ReleaseError::Parse {
        path: metadata_path.to_path_buf(),
        message: "could not find version = \"X.Y.Z\"".to_string(),
    }
}

/// Return the version currently recorded in `metadata_path`.
pub fn current(metadata_path: &Path) -> Result<Version> {
    let text = read_metadata(metadata_path)?;
    version::find_version(&text)
        .map(|found| found.version)
        .ok_or_else(|| missing_version(metadata_path))
}

/// Increment the patch component of the first `version = "X.Y.Z"` line and
/// write the file back.
///
/// The file is left untouched when no version line exists or the patch
/// component cannot be incremented.
pub fn bump(metadata_path: &Path) -> Result<Version> {
    let text = read_metadata(metadata_path)?;
    let (new_text, new_version) =
        version::bump_text(&text).map_err(|err| ReleaseError::Parse {
            path: metadata_path.to_path_buf(),
            message: err.to_string(),
        })?;
    fs::write(metadata_path, new_text)?;
    info!(path = %metadata_path.display(), version = %new_version, "bumped version");
    Ok(new_version)
}

/// Where a bumped version gets published in source control.
#[derive(Debug, Clone)]
pub struct VcsTarget<'a> {
    /// Remote that receives the tag.
    pub remote: &'a str,
    /// Prefix prepended to the version to form the tag name.
    pub tag_prefix: &'a str,
}

impl VcsTarget<'_> {
    /// Tag name for `version`.
    pub fn tag_for(&self, version: &Version) -> String {
        format!("{}{version}", self.tag_prefix)
    }
}

/// Bump the version, then commit the metadata file, tag the commit and push
/// both the branch and the tag.
///
/// A failing git step stops the sequence. Work already done (the rewritten
/// file, a local commit or tag) is left in place.
pub fn bump_and_publish_to_vcs(
    git: &Git<'_>,
    metadata_path: &Path,
    target: &VcsTarget<'_>,
) -> Result<Version> {
    let new_version = bump(metadata_path)?;
    let tag = target.tag_for(&new_version);

    git.add(&[metadata_path])?;
    git.commit(&format!("Bump version to {new_version}"))?;
    git.tag(&tag)?;
    git.push()?;
    git.push_tag(target.remote, &tag)?;

    info!(%tag, "pushed release tag");
    Ok(new_version)
}
