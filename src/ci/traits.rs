//! ci::traits
//!
//! Pipeline control-plane trait definition.
//!
//! # Design
//!
//! The `Pipelines` trait is synchronous: every call blocks until the CLI
//! returns, and `fly watch` / `trigger-job -w` stream job output to the
//! operator while they run. A non-zero exit becomes
//! [`PipelineError::CommandFailed`] carrying the command line, exit code and
//! captured output.
//!
//! Script discovery returns every candidate. Choosing between several is
//! the caller's job.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors from the CI control plane.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The CLI executable could not be found.
    #[error("fly CLI not found: {0}")]
    ExecutableNotFound(String),

    /// A script or executable exists but cannot be executed.
    #[error("{} is not executable", path.display())]
    NotExecutable { path: PathBuf },

    /// The repository has no CI directory.
    #[error("CI directory not found at {}", path.display())]
    NoCiDir { path: PathBuf },

    /// No pipeline-definition script was found.
    #[error("no fly script found in {}", dir.display())]
    NoScript { dir: PathBuf },

    /// A command exited non-zero.
    #[error("'{command}' failed with exit code {code}")]
    CommandFailed {
        /// The command line that failed
        command: String,
        /// Exit code (-1 when killed by a signal)
        code: i32,
        /// Captured stdout and stderr
        output: String,
    },

    /// A command could not be started.
    #[error("failed to run '{command}': {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },
}

/// CI control plane for release pipelines.
pub trait Pipelines {
    /// `fly -t <target> unpause-pipeline -p <pipeline>`
    fn unpause_pipeline(&self, target: &str, pipeline: &str) -> Result<(), PipelineError>;

    /// `fly -t <target> trigger-job -j <pipeline/job> [-w]`
    fn trigger_job(&self, target: &str, job: &str, watch: bool) -> Result<(), PipelineError>;

    /// `fly -t <target> watch -j <pipeline/job>`
    fn watch_job(&self, target: &str, job: &str) -> Result<(), PipelineError>;

    /// `fly -t <target> destroy-pipeline -p <pipeline> -n`
    fn destroy_pipeline(&self, target: &str, pipeline: &str) -> Result<(), PipelineError>;

    /// Candidate pipeline-definition scripts in `ci_dir`, sorted by name.
    fn find_fly_scripts(&self, ci_dir: &Path) -> Result<Vec<PathBuf>, PipelineError>;

    /// Run a pipeline-definition script with `args` from `cwd`.
    fn run_fly_script(&self, script: &Path, args: &[String], cwd: &Path)
        -> Result<(), PipelineError>;
}
