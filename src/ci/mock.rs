//! ci::mock
//!
//! Recording pipeline control plane for tests.
//!
//! # Example
//!
//! ```
//! use pipeline_helpers::ci::mock::{MockPipelines, PipelineCall};
//! use pipeline_helpers::ci::Pipelines;
//!
//! let ci = MockPipelines::new();
//! ci.trigger_job("f1", "p/set-release-pipeline", true).unwrap();
//! assert_eq!(
//!     ci.calls(),
//!     vec![PipelineCall::TriggerJob {
//!         target: "f1".into(),
//!         job: "p/set-release-pipeline".into(),
//!         watch: true,
//!     }]
//! );
//! ```

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use super::traits::{PipelineError, Pipelines};

/// Mock control plane. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockPipelines {
    inner: Arc<Mutex<MockPipelinesInner>>,
}

#[derive(Debug, Default)]
struct MockPipelinesInner {
    scripts: Option<Vec<PathBuf>>,
    fail_on: Option<FailOn>,
    calls: Vec<PipelineCall>,
}

/// Which call should fail, with exit code 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailOn {
    Unpause,
    Trigger,
    Watch,
    Destroy,
    Script,
}

/// Recorded call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineCall {
    Unpause { target: String, pipeline: String },
    TriggerJob { target: String, job: String, watch: bool },
    Watch { target: String, job: String },
    Destroy { target: String, pipeline: String },
    RunScript { script: PathBuf, args: Vec<String> },
}

impl MockPipelines {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report these scripts from discovery instead of reading the CI dir.
    pub fn with_scripts(self, scripts: Vec<PathBuf>) -> Self {
        self.state().scripts = Some(scripts);
        self
    }

    pub fn fail_on(self, fail_on: FailOn) -> Self {
        self.state().fail_on = Some(fail_on);
        self
    }

    /// Recorded calls, in order.
    pub fn calls(&self) -> Vec<PipelineCall> {
        self.state().calls.clone()
    }

    fn state(&self) -> MutexGuard<'_, MockPipelinesInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, call: PipelineCall, kind: FailOn) -> Result<(), PipelineError> {
        let mut inner = self.state();
        let command = format!("{:?}", call);
        inner.calls.push(call);
        if inner.fail_on == Some(kind) {
            return Err(PipelineError::CommandFailed {
                command,
                code: 1,
                output: String::new(),
            });
        }
        Ok(())
    }
}

impl Pipelines for MockPipelines {
    fn unpause_pipeline(&self, target: &str, pipeline: &str) -> Result<(), PipelineError> {
        self.record(
            PipelineCall::Unpause {
                target: target.into(),
                pipeline: pipeline.into(),
            },
            FailOn::Unpause,
        )
    }

    fn trigger_job(&self, target: &str, job: &str, watch: bool) -> Result<(), PipelineError> {
        self.record(
            PipelineCall::TriggerJob {
                target: target.into(),
                job: job.into(),
                watch,
            },
            FailOn::Trigger,
        )
    }

    fn watch_job(&self, target: &str, job: &str) -> Result<(), PipelineError> {
        self.record(
            PipelineCall::Watch {
                target: target.into(),
                job: job.into(),
            },
            FailOn::Watch,
        )
    }

    fn destroy_pipeline(&self, target: &str, pipeline: &str) -> Result<(), PipelineError> {
        self.record(
            PipelineCall::Destroy {
                target: target.into(),
                pipeline: pipeline.into(),
            },
            FailOn::Destroy,
        )
    }

    fn find_fly_scripts(&self, ci_dir: &Path) -> Result<Vec<PathBuf>, PipelineError> {
        match self.state().scripts.clone() {
            Some(scripts) if scripts.is_empty() => Err(PipelineError::NoScript {
                dir: ci_dir.to_path_buf(),
            }),
            Some(scripts) => Ok(scripts),
            None => super::fly::find_fly_scripts(ci_dir, None),
        }
    }

    fn run_fly_script(
        &self,
        script: &Path,
        args: &[String],
        _cwd: &Path,
    ) -> Result<(), PipelineError> {
        self.record(
            PipelineCall::RunScript {
                script: script.to_path_buf(),
                args: args.to_vec(),
            },
            FailOn::Script,
        )
    }
}
