use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use liboutput::Output;
use tracing::info;

use crate::{
    artifacts::{collect_artifacts, output_files},
    bump::{self, VcsTarget},
    clean::{self, CleanReport, CleanTargets},
    config::{self, ProjectConfig, ReleaseOptions},
    credential::resolve_credential,
    error::{ReleaseError, Result},
    git::Git,
    interpreter::{Interpreter, locate_interpreter},
    process::{Invocation, ToolInvoker},
    version::{self, Version},
};

/// Username that tells the upload tool the password is an API token.
const TOKEN_USERNAME: &str = "__token__";

/// Progress points of a release run, in the order they are reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Nothing has happened yet.
    Start,
    /// Previous build output was removed.
    Cleaned,
    /// The version was bumped, committed, tagged and pushed.
    Bumped,
    /// The interpreter for build and upload was chosen.
    InterpreterResolved,
    /// Distributions were built.
    Built,
    /// Uncommitted changes were committed and pushed.
    CommittedLeftovers,
    /// Artifacts were uploaded.
    Published,
    /// The run completed.
    Done,
}

/// Outcome of a successful release run.
#[derive(Debug, Clone)]
pub struct ReleaseReport {
    /// Stages reached, starting with [`Stage::Start`] and ending with [`Stage::Done`].
    pub stages: Vec<Stage>,
    /// Directories removed by the clean step.
    pub cleaned: CleanReport,
    /// New version when the run bumped it.
    pub version: Option<Version>,
    /// Interpreter used for the build and upload tools.
    pub interpreter: Option<Interpreter>,
    /// Files handed to the upload tool.
    pub uploaded: Vec<PathBuf>,
}

impl ReleaseReport {
    /// Record that `stage` was reached.
    fn reach(&mut self, stage: Stage) {
        info!(?stage, "release stage reached");
        self.stages.push(stage);
    }

    /// Whether `stage` was reached.
    pub fn reached(&self, stage: Stage) -> bool {
        self.stages.contains(&stage)
    }
}

impl Default for ReleaseReport {
    fn default() -> Self {
        Self {
            stages: vec![Stage::Start],
            cleaned: CleanReport::default(),
            version: None,
            interpreter: None,
            uploaded: Vec::new(),
        }
    }
}

/// Release workflow bound to one project root.
pub struct Release {
    /// Project root; every path and tool invocation is relative to it.
    root: PathBuf,
    /// Project settings.
    config: ProjectConfig,
    /// Runner for git, the build tool and the upload tool.
    invoker: Arc<dyn ToolInvoker>,
    /// Sink for progress messages.
    output: Arc<dyn Output>,
}

impl Release {
    /// Create a release workflow for the project at `root`.
    pub fn new(
        root: PathBuf,
        config: ProjectConfig,
        invoker: Arc<dyn ToolInvoker>,
        output: Arc<dyn Output>,
    ) -> Self {
        Self {
            root,
            config,
            invoker,
            output,
        }
    }

    /// Project root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of the metadata file.
    pub fn metadata_path(&self) -> PathBuf {
        config::resolve(&self.root, &self.config.metadata_file)
    }

    /// Absolute path of the artifact output directory.
    pub fn output_dir(&self) -> PathBuf {
        config::resolve(&self.root, &self.config.output_dir)
    }

    /// Git operations on the project root.
    fn git(&self) -> Git<'_> {
        Git::new(self.invoker.as_ref(), &self.root)
    }

    /// Version currently recorded in the metadata file.
    pub fn current_version(&self) -> Result<Version> {
        bump::current(&self.metadata_path())
    }

    /// Bump the patch version; with `vcs`, also commit, tag and push it.
    pub fn bump(&self, vcs: bool) -> Result<Version> {
        let path = self.metadata_path();
        if !vcs {
            return bump::bump(&path);
        }
        let target = VcsTarget {
            remote: &self.config.remote,
            tag_prefix: &self.config.tag_prefix,
        };
        bump::bump_and_publish_to_vcs(&self.git(), &path, &target)
    }

    /// Run the full release sequence.
    ///
    /// Steps run strictly in order and the first failure ends the run; steps
    /// that already completed are not undone. `env` looks up environment
    /// variables for credential resolution.
    pub fn run<F>(&self, options: &ReleaseOptions, env: F) -> Result<ReleaseReport>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut report = ReleaseReport::default();

        self.output.message("Cleaning previous build output...")?;
        report.cleaned = clean::clean(
            &self.root,
            &CleanTargets {
                build_dir: &self.config.build_dir,
                output_dir: &self.config.output_dir,
                metadata_suffix: &self.config.metadata_suffix,
                skip_dirs: &self.config.venv_dirs,
            },
        )?;
        for path in &report.cleaned.removed {
            self.output.item("removed", &self.display_path(path))?;
        }
        report.reach(Stage::Cleaned);

        if options.bump {
            self.output.message("Bumping version...")?;
            let version = self.bump(true)?;
            self.output.success(&format!(
                "Tagged and pushed {}{version}",
                self.config.tag_prefix
            ))?;
            report.version = Some(version);
            report.reach(Stage::Bumped);
        }

        let interpreter = locate_interpreter(&self.root, &self.config.venv_dirs);
        self.output
            .item("interpreter", &self.display_path(&interpreter.program))?;
        report.reach(Stage::InterpreterResolved);

        self.output.message("Building distributions...")?;
        self.build(&interpreter)?;
        self.output.success("Build complete")?;
        report.reach(Stage::Built);

        if options.bump {
            // The bump already pushed; anything the build left behind stays
            // uncommitted.
            if self.git().has_uncommitted_changes()? {
                self.output
                    .warn("Working tree has uncommitted changes after the build; not committing")?;
            }
        } else if self.commit_leftovers()? {
            report.reach(Stage::CommittedLeftovers);
        }

        if options.publish {
            report.uploaded = self.publish(&interpreter, &options.token_file, &env)?;
            report.reach(Stage::Published);
        }

        report.interpreter = Some(interpreter);
        report.reach(Stage::Done);
        Ok(report)
    }

    /// Invoke the build tool for a source and a binary distribution.
    fn build(&self, interpreter: &Interpreter) -> Result<()> {
        let invocation = Invocation::new("build", &interpreter.program, &self.root)
            .args(["-m", "build", "--sdist", "--wheel", "--outdir"])
            .arg(self.output_dir())
            .inherit();
        self.invoker.invoke(&invocation)?.check("build")?;
        Ok(())
    }

    /// Commit and push any uncommitted changes; returns whether a commit was made.
    fn commit_leftovers(&self) -> Result<bool> {
        let git = self.git();
        if !git.has_uncommitted_changes()? {
            self.output.message("Working tree clean, nothing to commit")?;
            return Ok(false);
        }
        self.output.message("Committing uncommitted changes...")?;
        git.add_all()?;
        git.commit(&self.config.leftover_commit_message)?;
        git.push()?;
        self.output.success("Committed and pushed")?;
        Ok(true)
    }

    /// Resolve the token, check this package's artifacts exist and upload the
    /// output directory.
    fn publish<F>(
        &self,
        interpreter: &Interpreter,
        token_file: &Path,
        env: &F,
    ) -> Result<Vec<PathBuf>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token_path = config::resolve(&self.root, token_file);
        let credential = resolve_credential(&token_path, &self.config.token_env, env)?;

        let output_dir = self.output_dir();
        let prefix = self.artifact_prefix()?;
        collect_artifacts(&output_dir, &prefix)?;
        let artifacts = output_files(&output_dir)?;

        self.output
            .message(&format!("Publishing {} artifact(s)...", artifacts.len()))?;
        let section = self.output.section();
        for artifact in &artifacts {
            section.item("artifact", &self.display_path(artifact))?;
        }

        let invocation = Invocation::new("twine", &interpreter.program, &self.root)
            .args(["-m", "twine", "upload", "--non-interactive"])
            .args(&artifacts)
            .env("TWINE_USERNAME", TOKEN_USERNAME)
            .env("TWINE_PASSWORD", credential.expose())
            .inherit();
        self.invoker.invoke(&invocation)?.check("twine")?;

        self.output.success("Published")?;
        Ok(artifacts)
    }

    /// File name prefix of this package's artifacts.
    fn artifact_prefix(&self) -> Result<String> {
        if let Some(prefix) = &self.config.package_prefix {
            return Ok(prefix.clone());
        }
        let path = self.metadata_path();
        if !path.is_file() {
            return Err(ReleaseError::NotFound { path });
        }
        let text = fs::read_to_string(&path)?;
        let name = version::find_package_name(&text).ok_or_else(|| ReleaseError::Parse {
            path: path.clone(),
            message: "could not find name = \"...\"".to_string(),
        })?;
        Ok(version::distribution_prefix(&name))
    }

    /// Render `path` relative to the root when it lies inside it.
    fn display_path(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .display()
            .to_string()
    }
}
