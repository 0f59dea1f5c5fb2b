use std::{
    fs, io,
    path::{Path, PathBuf},
    result::Result as StdResult,
};

use serde::Deserialize;
use toml::de::Error as TomlError;

use crate::error::{ReleaseError, Result};

/// Default token file consulted by the publish step.
pub const DEFAULT_TOKEN_FILE: &str = "pip_token.txt";

/// Switches for a single release run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseOptions {
    /// Bump, commit, tag and push the version before building.
    pub bump: bool,
    /// Upload the built artifacts.
    pub publish: bool,
    /// Token file, relative to the project root unless absolute.
    pub token_file: PathBuf,
}

impl Default for ReleaseOptions {
    fn default() -> Self {
        Self {
            bump: false,
            publish: false,
            token_file: PathBuf::from(DEFAULT_TOKEN_FILE),
        }
    }
}

/// Project-level settings, read from `pyrelease.toml` in the project root.
///
/// Every key is optional; absent keys keep their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectConfig {
    /// Metadata file holding `name` and `version`.
    pub metadata_file: PathBuf,
    /// Directory the build tool writes distributions to.
    pub output_dir: PathBuf,
    /// Build-cache directory removed before building.
    pub build_dir: PathBuf,
    /// Suffix of generated package-metadata directories removed before building.
    pub metadata_suffix: String,
    /// Virtual environment directories searched for an interpreter, in order.
    pub venv_dirs: Vec<String>,
    /// Artifact file name prefix; derived from the package name when unset.
    pub package_prefix: Option<String>,
    /// Environment variable holding the upload token.
    pub token_env: String,
    /// Remote receiving release tags.
    pub remote: String,
    /// Prefix of release tags.
    pub tag_prefix: String,
    /// Commit message used when committing leftover changes after a build.
    pub leftover_commit_message: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            metadata_file: PathBuf::from("pyproject.toml"),
            output_dir: PathBuf::from("dist"),
            build_dir: PathBuf::from("build"),
            metadata_suffix: ".egg-info".to_string(),
            venv_dirs: vec![".venv".to_string(), "venv".to_string()],
            package_prefix: None,
            token_env: "PYPI_API_TOKEN".to_string(),
            remote: "origin".to_string(),
            tag_prefix: "v".to_string(),
            leftover_commit_message: "Update build metadata".to_string(),
        }
    }
}

impl ProjectConfig {
    /// File name looked up in the project root.
    pub const FILE_NAME: &'static str = "pyrelease.toml";

    /// Load `pyrelease.toml` from `root`, falling back to defaults when absent.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(Self::FILE_NAME);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => {
                return Err(ReleaseError::Config(format!(
                    "failed to read {}: {err}",
                    path.display()
                )));
            }
        };
        Self::parse(&contents)
            .map_err(|err| ReleaseError::Config(format!("{}: {err}", path.display())))
    }

    /// Parse configuration from TOML text.
    pub fn parse(contents: &str) -> StdResult<Self, TomlError> {
        toml::from_str(contents)
    }
}

/// Resolve `path` against `root` unless it is already absolute.
pub fn resolve(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_uses_defaults() -> Result<()> {
        let temp = TempDir::new()?;
        let config = ProjectConfig::load(temp.path())?;
        assert_eq!(config, ProjectConfig::default());
        assert_eq!(config.token_env, "PYPI_API_TOKEN");
        assert_eq!(config.tag_prefix, "v");
        Ok(())
    }

    #[test]
    fn test_partial_file_overrides_selected_keys() -> Result<()> {
        let temp = TempDir::new()?;
        fs::write(
            temp.path().join(ProjectConfig::FILE_NAME),
            "output_dir = \"out\"\npackage_prefix = \"minecode_mcp-\"\nvenv_dirs = [\"env\"]\n",
        )?;

        let config = ProjectConfig::load(temp.path())?;
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.package_prefix.as_deref(), Some("minecode_mcp-"));
        assert_eq!(config.venv_dirs, vec!["env".to_string()]);
        assert_eq!(config.metadata_file, PathBuf::from("pyproject.toml"));
        Ok(())
    }

    #[test]
    fn test_unknown_key_is_rejected() -> Result<()> {
        let temp = TempDir::new()?;
        fs::write(temp.path().join(ProjectConfig::FILE_NAME), "outdir = \"x\"\n")?;

        let err = ProjectConfig::load(temp.path()).unwrap_err();
        assert!(matches!(err, ReleaseError::Config(ref msg) if msg.contains("outdir")));
        assert_eq!(err.exit_code(), 1);
        Ok(())
    }

    #[test]
    fn test_resolve_relative_and_absolute() {
        let root = Path::new("/project");
        assert_eq!(
            resolve(root, Path::new("pip_token.txt")),
            PathBuf::from("/project/pip_token.txt")
        );
        let abs = if cfg!(windows) {
            PathBuf::from(r"C:\secrets\token")
        } else {
            PathBuf::from("/secrets/token")
        };
        assert_eq!(resolve(root, &abs), abs);
    }
}
