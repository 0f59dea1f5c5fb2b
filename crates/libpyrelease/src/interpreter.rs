use std::path::{Path, PathBuf};

use tracing::debug;

/// Where the chosen interpreter came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpreterSource {
    /// A virtual environment inside the project root.
    VirtualEnv,
    /// Resolved from `PATH`.
    System,
    /// Nothing was found; the bare program name is left to the OS.
    Fallback,
}

/// Interpreter used to drive the build and upload tools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpreter {
    /// Program to execute.
    pub program: PathBuf,
    /// How it was found.
    pub source: InterpreterSource,
}

/// Path of the interpreter inside a virtual environment directory.
fn venv_python(venv: &Path) -> PathBuf {
    if cfg!(windows) {
        venv.join("Scripts").join("python.exe")
    } else {
        venv.join("bin").join("python")
    }
}

/// Pick the interpreter for the build and upload steps.
///
/// Each directory in `venv_dirs` (relative to `root`) is checked in order for
/// a virtual environment interpreter. Without one, `python3` and then
/// `python` are looked up on `PATH`.
pub fn locate_interpreter(root: &Path, venv_dirs: &[String]) -> Interpreter {
    for dir in venv_dirs {
        let candidate = venv_python(&root.join(dir));
        if candidate.is_file() {
            debug!(path = %candidate.display(), "using virtual environment interpreter");
            return Interpreter {
                program: candidate,
                source: InterpreterSource::VirtualEnv,
            };
        }
    }

    for name in ["python3", "python"] {
        if let Ok(path) = which::which(name) {
            debug!(path = %path.display(), "using system interpreter");
            return Interpreter {
                program: path,
                source: InterpreterSource::System,
            };
        }
    }

    Interpreter {
        program: PathBuf::from("python"),
        source: InterpreterSource::Fallback,
    }
}
