#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
//! Output abstractions for the progress messages printed during a release.
//!
//! This crate provides an [`Output`] trait that abstracts over how user messages
//! are rendered. Implementations include:
//!
//! - [`Terminal`]: A color-capable terminal renderer for production use
//! - [`Quiet`]: A silent implementation that suppresses output
//! - [`Recorder`]: Captures every message in memory so tests can assert on it

use std::{
    io::{self, Write},
    result::Result as StdResult,
    sync::{Arc, Mutex, PoisonError},
};

use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};
use thiserror::Error;

/// Indentation level (in spaces) used for nested output sections.
const INDENT: usize = 4;

/// Errors produced by [`Output`] implementations.
#[derive(Debug, Error)]
pub enum OutputError {
    /// Underlying I/O error while writing to the terminal.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Convenience alias for output-related fallible operations.
pub type Result<T> = StdResult<T, OutputError>;

/// Abstraction over how user-facing messages are produced.
///
/// Implementations can render to a terminal, suppress output, or record the
/// messages for later inspection.
pub trait Output: Send + Sync {
    /// Print an informational message.
    fn message(&self, msg: &str) -> Result<()>;
    /// Print a success message.
    fn success(&self, msg: &str) -> Result<()>;
    /// Print a warning message.
    fn warn(&self, msg: &str) -> Result<()>;
    /// Print an error/failure message.
    fn fail(&self, msg: &str) -> Result<()>;
    /// Print a labelled value, e.g. `interpreter: .venv/bin/python`.
    fn item(&self, label: &str, value: &str) -> Result<()>;
    /// Flush any buffered output.
    fn finish(&self) -> Result<()>;
    /// Create a nested output that indents subsequent messages.
    ///
    /// Callers print any header themselves before nesting.
    fn section(&self) -> Box<dyn Output>;
}

/// Output implementation that suppresses all messages.
pub struct Quiet;

impl Output for Quiet {
    fn message(&self, _msg: &str) -> Result<()> {
        Ok(())
    }

    fn success(&self, _msg: &str) -> Result<()> {
        Ok(())
    }

    fn warn(&self, _msg: &str) -> Result<()> {
        Ok(())
    }

    fn fail(&self, _msg: &str) -> Result<()> {
        Ok(())
    }

    fn item(&self, _label: &str, _value: &str) -> Result<()> {
        Ok(())
    }

    fn finish(&self) -> Result<()> {
        Ok(())
    }

    fn section(&self) -> Box<dyn Output> {
        Box::new(Self)
    }
}

/// Color-capable terminal renderer for user messages.
pub struct Terminal {
    /// Whether to emit ANSI color sequences when writing to stdout.
    color_choice: ColorChoice,
    /// Current indentation depth in spaces.
    indent: usize,
}

impl Terminal {
    /// Create a new terminal output.
    ///
    /// - `color`: when `true`, always render colored output; when `false`,
    ///   disable ANSI colors.
    pub fn new(color: bool) -> Self {
        let color_choice = if color {
            ColorChoice::Always
        } else {
            ColorChoice::Never
        };
        Self {
            color_choice,
            indent: 0,
        }
    }

    /// Write `msg` using `color` while honoring the current indentation level.
    fn write_colored(&self, msg: &str, color: Color) -> Result<()> {
        let mut stdout = StandardStream::stdout(self.color_choice);
        stdout.set_color(ColorSpec::new().set_fg(Some(color)))?;
        writeln!(stdout, "{}{msg}", " ".repeat(self.indent))?;
        stdout.reset()?;
        stdout.flush()?;
        Ok(())
    }
}

impl Output for Terminal {
    fn message(&self, msg: &str) -> Result<()> {
        self.write_colored(msg, Color::Cyan)
    }

    fn success(&self, msg: &str) -> Result<()> {
        self.write_colored(msg, Color::Green)
    }

    fn warn(&self, msg: &str) -> Result<()> {
        self.write_colored(msg, Color::Rgb(255, 165, 0)) // Orange
    }

    fn fail(&self, msg: &str) -> Result<()> {
        self.write_colored(msg, Color::Red)
    }

    fn item(&self, label: &str, value: &str) -> Result<()> {
        let mut stdout = StandardStream::stdout(self.color_choice);
        write!(stdout, "{}", " ".repeat(self.indent))?;
        stdout.set_color(ColorSpec::new().set_bold(true))?;
        write!(stdout, "{label}:")?;
        stdout.reset()?;
        writeln!(stdout, " {value}")?;
        stdout.flush()?;
        Ok(())
    }

    fn finish(&self) -> Result<()> {
        io::stdout().flush()?;
        Ok(())
    }

    fn section(&self) -> Box<dyn Output> {
        Box::new(Self {
            color_choice: self.color_choice,
            indent: self.indent + INDENT,
        })
    }
}

/// Kind of message captured by a [`Recorder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// Informational message or section header.
    Message,
    /// Success message.
    Success,
    /// Warning message.
    Warn,
    /// Failure message.
    Fail,
    /// Labelled value.
    Item,
}

/// A single captured line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// Message kind.
    pub level: Level,
    /// Indentation depth in spaces at the time of writing.
    pub indent: usize,
    /// Rendered text, `label: value` for items.
    pub text: String,
}

/// Output implementation that keeps every line in memory.
///
/// Sections share the parent's buffer, so a single [`Recorder::lines`] call
/// returns the whole transcript in order.
#[derive(Clone, Default)]
pub struct Recorder {
    /// Shared transcript.
    lines: Arc<Mutex<Vec<Line>>>,
    /// Current indentation depth in spaces.
    indent: usize,
}

impl Recorder {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all captured lines.
    pub fn lines(&self) -> Vec<Line> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Captured text for lines of the given level.
    pub fn texts(&self, level: Level) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|line| line.level == level)
            .map(|line| line.text)
            .collect()
    }

    /// Append a line to the transcript.
    fn push(&self, level: Level, text: String) -> Result<()> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Line {
                level,
                indent: self.indent,
                text,
            });
        Ok(())
    }
}

impl Output for Recorder {
    fn message(&self, msg: &str) -> Result<()> {
        self.push(Level::Message, msg.to_string())
    }

    fn success(&self, msg: &str) -> Result<()> {
        self.push(Level::Success, msg.to_string())
    }

    fn warn(&self, msg: &str) -> Result<()> {
        self.push(Level::Warn, msg.to_string())
    }

    fn fail(&self, msg: &str) -> Result<()> {
        self.push(Level::Fail, msg.to_string())
    }

    fn item(&self, label: &str, value: &str) -> Result<()> {
        self.push(Level::Item, format!("{label}: {value}"))
    }

    fn finish(&self) -> Result<()> {
        Ok(())
    }

    fn section(&self) -> Box<dyn Output> {
        Box::new(Self {
            lines: Arc::clone(&self.lines),
            indent: self.indent + INDENT,
        })
    }
}
