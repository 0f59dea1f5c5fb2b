#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
//! Core library for releasing Python packages with pyrelease.
//!
//! The crate bumps the patch version in a project's metadata file, publishes
//! the bump to git, and drives the clean, build and upload steps of a
//! release. Every external tool runs through [`ToolInvoker`], so callers can
//! substitute their own runner. The CLI binary in `crates/pyrelease` builds on
//! top of this library.

/// Locating built distribution files.
pub mod artifacts;
/// Patch-level version bumping.
pub mod bump;
/// Removal of previous build output.
pub mod clean;
/// Project and per-run settings.
pub mod config;
/// Upload token resolution.
pub mod credential;
/// Error type shared by every operation.
mod error;
/// Git operations on a project root.
pub mod git;
/// Python interpreter discovery.
pub mod interpreter;
/// External tool invocation.
pub mod process;
/// The end-to-end release workflow.
pub mod release;
/// Version parsing and metadata-file text handling.
pub mod version;

/// Test doubles for tool invocation.
#[cfg(test)]
mod testutil;

pub use config::{ProjectConfig, ReleaseOptions};
pub use error::{ReleaseError, Result};
pub use git::find_root;
pub use process::{SystemInvoker, ToolInvoker};
pub use release::{Release, ReleaseReport, Stage};
pub use version::Version;
