use anyhow::{Context, Result, ensure};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Metadata file used by every test project.
pub const PYPROJECT: &str = "[project]\nname = \"demo-pkg\"\nversion = \"1.2.3\"\n";

/// Return the path to the compiled `pyrelease` binary for integration-style tests.
pub fn pyrelease_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_pyrelease"))
}

/// Run a git command inside `repo_path`, ensuring it succeeds.
pub fn git(repo_path: &Path, args: &[&str]) -> Result<Output> {
    let output = Command::new("git")
        .current_dir(repo_path)
        .args(args)
        .output()
        .with_context(|| format!("failed to run git {}", args.join(" ")))?;

    ensure!(
        output.status.success(),
        "git command failed: git {}\nstdout: {}\nstderr: {}",
        args.join(" "),
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );

    Ok(output)
}

/// Trimmed stdout of a git command.
pub fn git_stdout(repo_path: &Path, args: &[&str]) -> Result<String> {
    let output = git(repo_path, args)?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// A project checkout with a bare remote, both inside one temp dir.
pub struct Project {
    /// Keeps the directories alive for the test's duration.
    _temp: TempDir,
    /// Working tree.
    pub root: PathBuf,
    /// Bare repository configured as `origin`.
    pub remote: PathBuf,
    /// File the fake interpreter appends its invocations to.
    pub log: PathBuf,
}

impl Project {
    /// Create a committed project with a fake interpreter in `.venv`.
    pub fn new() -> Result<Self> {
        let temp = TempDir::new()?;
        let root = temp.path().join("demo");
        let remote = temp.path().join("remote.git");
        let log = temp.path().join("python.log");
        fs::create_dir_all(&root)?;

        git(temp.path(), &["init", "--bare", "-b", "main", "remote.git"])?;
        git(&root, &["init", "-b", "main"])?;
        git(&root, &["config", "user.email", "test@example.com"])?;
        git(&root, &["config", "user.name", "Test User"])?;
        git(&root, &["config", "commit.gpgsign", "false"])?;
        git(&root, &["config", "tag.gpgsign", "false"])?;

        fs::write(root.join("pyproject.toml"), PYPROJECT)?;
        fs::write(
            root.join(".gitignore"),
            ".venv/\ndist/\nbuild/\n*.egg-info/\npip_token.txt\n",
        )?;
        git(&root, &["add", "."])?;
        git(&root, &["commit", "-m", "Initial commit"])?;

        let remote_str = remote.to_string_lossy().into_owned();
        git(&root, &["remote", "add", "origin", &remote_str])?;
        git(&root, &["push", "-u", "origin", "main"])?;

        install_fake_python(&root)?;
        Ok(Self {
            _temp: temp,
            root,
            remote,
            log,
        })
    }

    /// Prepare a `Command` running `pyrelease` against this project.
    pub fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(pyrelease_binary());
        cmd.current_dir(&self.root)
            .arg("--no-color")
            .args(args)
            .env("PYRELEASE_TEST_LOG", &self.log)
            .env_remove("PYRELEASE_TEST_BUILD_EXIT")
            .env_remove("PYPI_API_TOKEN");
        cmd
    }

    /// Run `pyrelease` against this project.
    pub fn run(&self, args: &[&str]) -> Result<Output> {
        self.command(args)
            .output()
            .with_context(|| format!("failed to run pyrelease {}", args.join(" ")))
    }

    /// Lines the fake interpreter logged.
    pub fn python_calls(&self) -> Result<Vec<String>> {
        if !self.log.exists() {
            return Ok(Vec::new());
        }
        Ok(fs::read_to_string(&self.log)?
            .lines()
            .map(str::to_string)
            .collect())
    }
}

/// Fake interpreter: logs its arguments, writes two sdists into the last
/// argument for `-m build` (or exits with `$PYRELEASE_TEST_BUILD_EXIT` when
/// set), and logs the upload username and password for `-m twine`.
const FAKE_PYTHON: &str = r#"#!/bin/sh
echo "$@" >> "$PYRELEASE_TEST_LOG"
case "$2" in
build)
    if [ -n "$PYRELEASE_TEST_BUILD_EXIT" ]; then
        exit "$PYRELEASE_TEST_BUILD_EXIT"
    fi
    for last; do :; done
    mkdir -p "$last"
    touch "$last/demo_pkg-1.2.3.tar.gz"
    touch "$last/other_pkg-9.9.9.tar.gz"
    ;;
twine)
    echo "auth $TWINE_USERNAME:$TWINE_PASSWORD" >> "$PYRELEASE_TEST_LOG"
    ;;
esac
exit 0
"#;

/// Write [`FAKE_PYTHON`] to `.venv/bin/python` under `root`.
#[cfg(unix)]
fn install_fake_python(root: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let bin = root.join(".venv").join("bin");
    fs::create_dir_all(&bin)?;
    let python = bin.join("python");
    fs::write(&python, FAKE_PYTHON)?;
    fs::set_permissions(&python, fs::Permissions::from_mode(0o755))?;
    Ok(())
}

/// Fake interpreters are shell scripts, so other platforms get none.
#[cfg(not(unix))]
fn install_fake_python(_root: &Path) -> Result<()> {
    Ok(())
}

/// Lossy stdout of a finished command.
pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Lossy stdout and stderr of a finished command, for diagnostics.
pub fn describe(output: &Output) -> String {
    format!(
        "status: {}\nstdout: {}\nstderr: {}",
        output.status,
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    )
}
