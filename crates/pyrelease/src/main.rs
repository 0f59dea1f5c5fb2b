#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
//! Command-line interface for bumping, building and publishing Python packages
//! via the libpyrelease crate.

use std::{
    env,
    io::{self, IsTerminal, Write},
    path::PathBuf,
    process,
    sync::Arc,
};

use anyhow::{Context, Result};
use clap::{ArgAction, ArgGroup, Parser, Subcommand};
use liboutput::{Output, Quiet, Terminal};
use libpyrelease::{
    ProjectConfig, Release, ReleaseError, ReleaseOptions, SystemInvoker, config::DEFAULT_TOKEN_FILE,
    find_root,
};
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(group(
    ArgGroup::new("color_mode")
        .args(["color", "no_color"])
))]
/// Top-level CLI options for pyrelease.
struct Cli {
    /// Project root (defaults to the enclosing git repository, else the current directory)
    #[arg(long, global = true, value_name = "DIR")]
    root: Option<PathBuf>,

    /// Enable colored output
    #[arg(long, global = true)]
    color: bool,

    /// Disable colored output
    #[arg(long = "no-color", global = true)]
    no_color: bool,

    /// Suppress progress messages
    #[arg(long, global = true)]
    quiet: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    /// The primary command to execute.
    command: Commands,
}

#[derive(Subcommand)]
/// CLI subcommands supported by pyrelease.
enum Commands {
    /// Increment the patch version in the metadata file
    Bump {
        /// Also commit the bump, tag it and push both
        #[arg(long)]
        git: bool,
    },

    /// Print the version recorded in the metadata file
    Current,

    /// Clean, build and optionally publish the package
    Release {
        /// Bump, commit, tag and push the version before building
        #[arg(long)]
        bump: bool,

        /// Upload the built artifacts to the package index
        #[arg(long)]
        publish: bool,

        /// File holding the upload token, relative to the project root
        #[arg(long, value_name = "PATH", default_value = DEFAULT_TOKEN_FILE)]
        token_file: PathBuf,
    },
}

/// Install the stderr log subscriber.
///
/// `RUST_LOG` is honoured unless `-v` was given.
fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr).with_target(false))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let color = if cli.color {
        true
    } else if cli.no_color {
        false
    } else {
        io::stdout().is_terminal()
    };

    let output: Arc<dyn Output> = if cli.quiet {
        Arc::new(Quiet)
    } else {
        Arc::new(Terminal::new(color))
    };

    if let Err(e) = run(cli, &output) {
        // Reset any existing colors only if color was enabled and stdout is a TTY
        if color && io::stdout().is_terminal() {
            print!("\x1b[0m");
            if let Err(flush_err) = io::stdout().flush() {
                eprintln!("Failed to flush stdout while resetting colors: {flush_err}");
            }
        }

        if let Err(display_err) = output.fail(&format!("{e:#}")) {
            eprintln!("Failed to report error via output handler: {display_err:#}");
        }
        if let Err(finish_err) = output.finish() {
            eprintln!("Failed to flush output handler: {finish_err:#}");
        }

        let exit_code = e
            .downcast_ref::<ReleaseError>()
            .map_or(1, ReleaseError::exit_code);
        process::exit(exit_code);
    }

    Ok(())
}

/// Resolve the project root from the flag or the working directory.
fn project_root(flag: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(root) = flag {
        return Ok(root);
    }
    let cwd = env::current_dir().context("failed to read the current directory")?;
    Ok(find_root(&cwd).unwrap_or(cwd))
}

/// Execute the selected subcommand.
fn run(cli: Cli, output: &Arc<dyn Output>) -> Result<()> {
    let root = project_root(cli.root)?;
    debug!(root = %root.display(), "project root");
    let config = ProjectConfig::load(&root)?;
    let release = Release::new(root, config, Arc::new(SystemInvoker), Arc::clone(output));

    match cli.command {
        Commands::Bump { git } => {
            let version = release.bump(git)?;
            println!("{version}");
        }
        Commands::Current => {
            println!("{}", release.current_version()?);
        }
        Commands::Release {
            bump,
            publish,
            token_file,
        } => {
            let options = ReleaseOptions {
                bump,
                publish,
                token_file,
            };
            let report = release.run(&options, |name| env::var(name).ok())?;
            match report.version {
                Some(version) => output.success(&format!("Released {version}"))?,
                None => output.success("Release complete")?,
            }
        }
    }

    output.finish()?;
    Ok(())
}
