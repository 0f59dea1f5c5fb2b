use liboutput::OutputError;
use std::{io, path::PathBuf, result::Result as StdResult};
use thiserror::Error;

/// Custom Result type for release operations.
pub type Result<T> = StdResult<T, ReleaseError>;

/// Release-specific error types
#[derive(Error, Debug)]
pub enum ReleaseError {
    /// An expected file does not exist.
    #[error("File not found: {}", .path.display())]
    NotFound {
        /// The path that was expected to exist.
        path: PathBuf,
    },

    /// The metadata file has no `version = "X.Y.Z"` line, or it is malformed.
    #[error("Could not parse {}: {message}", .path.display())]
    Parse {
        /// File that was being parsed.
        path: PathBuf,
        /// Human-readable error description.
        message: String,
    },

    /// An external tool exited with a non-zero status.
    #[error("{tool} exited with status code {code}{}", format_stderr(.stderr))]
    ToolFailure {
        /// Short name of the tool (`git`, `build`, `twine`).
        tool: String,
        /// The process exit status code.
        code: i32,
        /// Captured standard error, empty when stdio was inherited.
        stderr: String,
    },

    /// An external tool could not be started at all.
    #[error("Failed to execute {tool}: {source}")]
    ToolSpawn {
        /// Short name of the tool.
        tool: String,
        /// The spawn failure.
        #[source]
        source: io::Error,
    },

    /// Neither the token file nor the environment variable yielded a token.
    #[error(
        "No upload token: {} is missing or empty and ${env_var} is not set",
        .token_file.display()
    )]
    NoCredential {
        /// Token file that was consulted.
        token_file: PathBuf,
        /// Environment variable that was consulted.
        env_var: String,
    },

    /// The output directory holds no artifacts for the current package.
    #[error("No artifacts matching '{prefix}*' in {}", .dir.display())]
    NoArtifacts {
        /// Directory that was searched.
        dir: PathBuf,
        /// File name prefix that artifacts must carry.
        prefix: String,
    },

    /// The project configuration file could not be loaded.
    #[error("Config error: {0}")]
    Config(String),

    /// Writing a progress message failed.
    #[error("Output error: {0}")]
    Output(#[from] OutputError),

    /// An underlying I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Render captured stderr as a trailing line of an error message.
fn format_stderr(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("\n{trimmed}")
    }
}

impl ReleaseError {
    /// Return the recommended process exit code for this error.
    ///
    /// Tool failures propagate the tool's own code; every internal
    /// precondition failure maps to 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ToolFailure { code, .. } => *code,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        let failure = ReleaseError::ToolFailure {
            tool: "twine".to_string(),
            code: 7,
            stderr: String::new(),
        };
        assert_eq!(failure.exit_code(), 7);

        let missing = ReleaseError::NotFound {
            path: PathBuf::from("pyproject.toml"),
        };
        assert_eq!(missing.exit_code(), 1);

        let no_token = ReleaseError::NoCredential {
            token_file: PathBuf::from("pip_token.txt"),
            env_var: "PYPI_API_TOKEN".to_string(),
        };
        assert_eq!(no_token.exit_code(), 1);
    }

    #[test]
    fn test_tool_failure_message_includes_stderr() {
        let err = ReleaseError::ToolFailure {
            tool: "git".to_string(),
            code: 128,
            stderr: "fatal: not a git repository\n".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "git exited with status code 128\nfatal: not a git repository"
        );

        let quiet = ReleaseError::ToolFailure {
            tool: "build".to_string(),
            code: 2,
            stderr: "  ".to_string(),
        };
        assert_eq!(quiet.to_string(), "build exited with status code 2");
    }
}
