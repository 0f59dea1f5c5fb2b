use std::{fmt, fs, io, path::Path};

use tracing::debug;

use crate::error::{ReleaseError, Result};

/// Upload token for the package index.
///
/// The value is only reachable through [`Credential::expose`]; `Debug` output
/// is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// The raw token, for handing to the upload tool.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Trimmed, non-empty token or `None`.
fn non_empty(raw: &str) -> Option<Credential> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| Credential(trimmed.to_string()))
}

/// Resolve the upload token.
///
/// The token file wins when it exists and holds something other than
/// whitespace; otherwise the environment variable `env_var` is consulted via
/// `lookup`. Both empty yields [`ReleaseError::NoCredential`].
pub fn resolve_credential<F>(token_file: &Path, env_var: &str, lookup: F) -> Result<Credential>
where
    F: Fn(&str) -> Option<String>,
{
    match fs::read_to_string(token_file) {
        Ok(contents) => {
            if let Some(token) = non_empty(&contents) {
                debug!(path = %token_file.display(), "using token file");
                return Ok(token);
            }
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => return Err(err.into()),
    }

    if let Some(token) = lookup(env_var).as_deref().and_then(non_empty) {
        debug!(env_var, "using token from environment");
        return Ok(token);
    }

    Err(ReleaseError::NoCredential {
        token_file: token_file.to_path_buf(),
        env_var: env_var.to_string(),
    })
}
