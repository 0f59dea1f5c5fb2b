use std::{
    ffi::{OsStr, OsString},
    fmt,
    path::{Path, PathBuf},
    process::{Command, Stdio as ProcessStdio},
};

use tracing::debug;

use crate::error::{ReleaseError, Result};

/// How a child process's standard streams are wired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stdio {
    /// Capture stdout and stderr for inspection.
    Capture,
    /// Share the parent's terminal so the user sees tool output live.
    Inherit,
}

/// A single external tool invocation.
///
/// The working directory is always explicit. Environment entries apply only
/// to the spawned child; the parent environment is never modified.
#[derive(Clone)]
pub struct Invocation {
    /// Short tool name used in errors and logs (`git`, `build`, `twine`).
    pub tool: String,
    /// Program to execute.
    pub program: OsString,
    /// Arguments passed to the program.
    pub args: Vec<OsString>,
    /// Working directory of the child.
    pub cwd: PathBuf,
    /// Extra environment variables for the child only.
    pub envs: Vec<(OsString, OsString)>,
    /// Stream wiring.
    pub stdio: Stdio,
}

impl Invocation {
    /// Start building an invocation of `program` inside `cwd`.
    pub fn new(tool: &str, program: impl AsRef<OsStr>, cwd: &Path) -> Self {
        Self {
            tool: tool.to_string(),
            program: program.as_ref().to_os_string(),
            args: Vec::new(),
            cwd: cwd.to_path_buf(),
            envs: Vec::new(),
            stdio: Stdio::Capture,
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Append several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    /// Set an environment variable on the child.
    pub fn env(mut self, key: impl AsRef<OsStr>, value: impl AsRef<OsStr>) -> Self {
        self.envs
            .push((key.as_ref().to_os_string(), value.as_ref().to_os_string()));
        self
    }

    /// Let the child write straight to the parent's terminal.
    pub fn inherit(mut self) -> Self {
        self.stdio = Stdio::Inherit;
        self
    }

    /// Program and arguments joined for display.
    pub fn command_line(&self) -> String {
        let mut parts = vec![self.program.to_string_lossy().into_owned()];
        parts.extend(self.args.iter().map(|a| a.to_string_lossy().into_owned()));
        parts.join(" ")
    }

    /// Whether the argument list equals `expected`.
    pub fn args_eq(&self, expected: &[&str]) -> bool {
        self.args.len() == expected.len() && self.args.iter().zip(expected).all(|(a, e)| a == e)
    }

    /// Value of an environment entry set on this invocation.
    pub fn env_value(&self, key: &str) -> Option<&OsStr> {
        self.envs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_os_str())
    }
}

impl fmt::Debug for Invocation {
    // Env values may hold credentials, so only the keys are shown.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let env_keys: Vec<_> = self.envs.iter().map(|(k, _)| k).collect();
        f.debug_struct("Invocation")
            .field("tool", &self.tool)
            .field("program", &self.program)
            .field("args", &self.args)
            .field("cwd", &self.cwd)
            .field("env_keys", &env_keys)
            .field("stdio", &self.stdio)
            .finish()
    }
}

/// Typed result of a finished invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Exit code, `None` when the child was terminated by a signal.
    pub code: Option<i32>,
    /// Captured stdout (empty for inherited stdio).
    pub stdout: String,
    /// Captured stderr (empty for inherited stdio).
    pub stderr: String,
}

impl ToolOutput {
    /// A successful run with the given stdout.
    pub fn ok(stdout: &str) -> Self {
        Self {
            code: Some(0),
            stdout: stdout.to_string(),
            stderr: String::new(),
        }
    }

    /// A failed run with the given exit code and stderr.
    pub fn failed(code: i32, stderr: &str) -> Self {
        Self {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.to_string(),
        }
    }

    /// Returns true if the tool exited with status zero.
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Convert a non-zero exit into [`ReleaseError::ToolFailure`].
    pub fn check(self, tool: &str) -> Result<Self> {
        if self.success() {
            return Ok(self);
        }
        Err(ReleaseError::ToolFailure {
            tool: tool.to_string(),
            code: self.code.unwrap_or(1),
            stderr: self.stderr,
        })
    }
}

/// Capability to run external tools.
///
/// The release workflow only talks to the outside world through this trait,
/// so tests substitute a scripted implementation.
pub trait ToolInvoker: Send + Sync {
    /// Run `invocation` to completion and report its outcome.
    ///
    /// A non-zero exit is not an error at this level; callers decide via
    /// [`ToolOutput::check`].
    fn invoke(&self, invocation: &Invocation) -> Result<ToolOutput>;
}

/// Runs invocations as real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemInvoker;

impl ToolInvoker for SystemInvoker {
    fn invoke(&self, invocation: &Invocation) -> Result<ToolOutput> {
        debug!(
            tool = %invocation.tool,
            cwd = %invocation.cwd.display(),
            "running {}",
            invocation.command_line()
        );

        let mut command = Command::new(&invocation.program);
        command
            .current_dir(&invocation.cwd)
            .args(&invocation.args)
            .envs(invocation.envs.iter().map(|(k, v)| (k, v)));

        let spawn_error = |source| ReleaseError::ToolSpawn {
            tool: invocation.tool.clone(),
            source,
        };

        let output = match invocation.stdio {
            Stdio::Capture => {
                let output = command.output().map_err(spawn_error)?;
                ToolOutput {
                    code: output.status.code(),
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                }
            }
            Stdio::Inherit => {
                let status = command
                    .stdin(ProcessStdio::inherit())
                    .stdout(ProcessStdio::inherit())
                    .stderr(ProcessStdio::inherit())
                    .status()
                    .map_err(spawn_error)?;
                ToolOutput {
                    code: status.code(),
                    ..ToolOutput::default()
                }
            }
        };

        debug!(tool = %invocation.tool, code = ?output.code, "finished");
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_debug_hides_env_values() {
        let invocation = Invocation::new("twine", "python", Path::new("/tmp"))
            .args(["-m", "twine"])
            .env("TWINE_PASSWORD", "pypi-secret");
        let rendered = format!("{invocation:?}");
        assert!(rendered.contains("TWINE_PASSWORD"));
        assert!(!rendered.contains("pypi-secret"));
        assert_eq!(
            invocation.env_value("TWINE_PASSWORD"),
            Some(OsStr::new("pypi-secret"))
        );
    }

    #[test]
    fn test_command_line_and_args_eq() {
        let invocation = Invocation::new("git", "git", Path::new(".")).args(["push", "origin"]);
        assert_eq!(invocation.command_line(), "git push origin");
        assert!(invocation.args_eq(&["push", "origin"]));
        assert!(!invocation.args_eq(&["push"]));
    }

    #[test]
    fn test_check_maps_exit_codes() {
        assert!(ToolOutput::ok("").check("git").is_ok());

        let err = ToolOutput::failed(3, "boom").check("build").unwrap_err();
        assert!(matches!(
            err,
            ReleaseError::ToolFailure { ref tool, code: 3, ref stderr } if tool == "build" && stderr == "boom"
        ));

        let signalled = ToolOutput {
            code: None,
            ..ToolOutput::default()
        };
        assert_eq!(signalled.check("twine").unwrap_err().exit_code(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_system_invoker_captures_output_and_env() -> Result<()> {
        let temp = TempDir::new()?;
        let invocation = Invocation::new("sh", "sh", temp.path())
            .args(["-c", "printf \"$GREETING\"; printf err >&2; exit 4"])
            .env("GREETING", "hello");
        let output = SystemInvoker.invoke(&invocation)?;
        assert_eq!(output.code, Some(4));
        assert_eq!(output.stdout, "hello");
        assert_eq!(output.stderr, "err");
        Ok(())
    }

    #[test]
    fn test_system_invoker_missing_program() -> Result<()> {
        let temp = TempDir::new()?;
        let invocation = Invocation::new("ghost", "definitely-not-a-real-program-xyz", temp.path());
        let err = SystemInvoker.invoke(&invocation).unwrap_err();
        assert!(matches!(err, ReleaseError::ToolSpawn { .. }));
        Ok(())
    }
}
