use std::{fmt, ops::Range, str::FromStr, sync::LazyLock};

use regex::Regex;
use thiserror::Error;

/// First `version = "X.Y.Z"` line; group 1 spans the dotted triple.
static VERSION_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^version\s*=\s*"((\d+)\.(\d+)\.(\d+))""#).expect("valid version regex")
});

/// First `name = "..."` line.
static NAME_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?m)^name\s*=\s*"([^"]+)""#).expect("valid name regex"));

/// Characters collapsed into `_` when normalising a distribution name.
static NAME_SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-_.]+").expect("valid separator regex"));

/// A three-part `major.minor.patch` version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    /// Major component.
    pub major: u64,
    /// Minor component.
    pub minor: u64,
    /// Patch component.
    pub patch: u64,
}

impl Version {
    /// Construct a version from its components.
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Increment the patch component by one, carrying major and minor over.
    ///
    /// Returns `None` when the patch component is already `u64::MAX`.
    pub fn bump_patch(self) -> Option<Self> {
        let patch = self.patch.checked_add(1)?;
        Some(Self { patch, ..self })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Error returned when a string is not a `major.minor.patch` triple.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid version '{0}': expected X.Y.Z")]
pub struct InvalidVersion(pub String);

impl FromStr for Version {
    type Err = InvalidVersion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidVersion(s.to_string());
        let mut parts = s.split('.');
        let mut next = || -> Result<u64, InvalidVersion> {
            let part = parts.next().ok_or_else(invalid)?;
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            part.parse().map_err(|_| invalid())
        };
        let version = Self::new(next()?, next()?, next()?);
        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(version)
    }
}

/// Why a metadata text could not be bumped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BumpTextError {
    /// No `version = "X.Y.Z"` line was found.
    #[error("could not find version = \"X.Y.Z\"")]
    MissingVersion,
    /// The patch component cannot grow any further.
    #[error("patch component of {0} cannot be incremented")]
    PatchOverflow(Version),
}

/// The authoritative version found in a metadata file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionMatch {
    /// Parsed version.
    pub version: Version,
    /// Byte range of the `X.Y.Z` text inside the quotes.
    pub span: Range<usize>,
}

/// Locate the first `version = "X.Y.Z"` line in `text`.
///
/// Returns `None` when no line matches, or when a component does not fit in
/// a `u64`.
pub fn find_version(text: &str) -> Option<VersionMatch> {
    let caps = VERSION_LINE.captures(text)?;
    let triple = caps.get(1)?;
    let version = triple.as_str().parse().ok()?;
    Some(VersionMatch {
        version,
        span: triple.range(),
    })
}

/// Rewrite `text` with the patch component of its version bumped.
///
/// Only the matched `X.Y.Z` span changes; every other byte is preserved.
/// Fails without producing any text when the version line is missing or the
/// patch component would overflow.
pub fn bump_text(text: &str) -> Result<(String, Version), BumpTextError> {
    let found = find_version(text).ok_or(BumpTextError::MissingVersion)?;
    let new_version = found
        .version
        .bump_patch()
        .ok_or(BumpTextError::PatchOverflow(found.version))?;
    let mut out = String::with_capacity(text.len() + 1);
    out.push_str(&text[..found.span.start]);
    out.push_str(&new_version.to_string());
    out.push_str(&text[found.span.end..]);
    Ok((out, new_version))
}

/// Locate the first `name = "..."` line in `text`.
pub fn find_package_name(text: &str) -> Option<String> {
    NAME_LINE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// File name prefix used by the build tool for a distribution `name`.
///
/// The name is lowercased and every run of `-`, `_` or `.` becomes a single
/// `_`, then a `-` separator is appended: `Minecode-MCP` gives `minecode_mcp-`.
pub fn distribution_prefix(name: &str) -> String {
    let lower = name.to_lowercase();
    let normalized = NAME_SEPARATORS.replace_all(&lower, "_");
    format!("{normalized}-")
}
