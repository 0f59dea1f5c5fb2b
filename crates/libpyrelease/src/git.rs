use std::path::{Path, PathBuf};

use crate::{
    error::Result,
    process::{Invocation, ToolInvoker, ToolOutput},
};

/// Source-control operations run against the repository at `root`.
pub struct Git<'a> {
    /// Tool runner used for every git call.
    invoker: &'a dyn ToolInvoker,
    /// Repository root; every command runs here.
    root: &'a Path,
}

impl<'a> Git<'a> {
    /// Bind git operations to a repository root.
    pub fn new(invoker: &'a dyn ToolInvoker, root: &'a Path) -> Self {
        Self { invoker, root }
    }

    /// Run a git command with the given arguments in the repository root.
    /// Returns the output if successful, otherwise a `ToolFailure` carrying stderr.
    fn run(&self, args: &[&str]) -> Result<ToolOutput> {
        let invocation = Invocation::new("git", "git", self.root).args(args);
        self.invoker.invoke(&invocation)?.check("git")
    }

    /// Check whether the repository has staged, unstaged or untracked changes.
    pub fn has_uncommitted_changes(&self) -> Result<bool> {
        let output = self.run(&["status", "--porcelain"])?;
        Ok(!output.stdout.trim().is_empty())
    }

    /// Stage the given paths.
    pub fn add(&self, paths: &[&Path]) -> Result<()> {
        let invocation = Invocation::new("git", "git", self.root)
            .arg("add")
            .arg("--")
            .args(paths);
        self.invoker.invoke(&invocation)?.check("git")?;
        Ok(())
    }

    /// Stage all tracked and untracked changes in the repository.
    pub fn add_all(&self) -> Result<()> {
        self.run(&["add", "."])?;
        Ok(())
    }

    /// Create a commit with the provided `message`.
    pub fn commit(&self, message: &str) -> Result<()> {
        self.run(&["commit", "-m", message])?;
        Ok(())
    }

    /// Create a lightweight tag at `HEAD`.
    pub fn tag(&self, name: &str) -> Result<()> {
        self.run(&["tag", name])?;
        Ok(())
    }

    /// Push the current branch to its configured upstream.
    pub fn push(&self) -> Result<()> {
        self.run(&["push"])?;
        Ok(())
    }

    /// Push a single tag to `remote`.
    pub fn push_tag(&self, remote: &str, tag: &str) -> Result<()> {
        self.run(&["push", remote, tag])?;
        Ok(())
    }
}

/// Walk up from `start_dir` to find the nearest repository root containing a `.git` entry.
pub fn find_root(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir;
    loop {
        if current.join(".git").exists() {
            return Some(current.to_path_buf());
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return None,
        }
    }
}
