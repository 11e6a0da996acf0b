//! release::pipelines
//!
//! Pipeline sequences shared by the release workflows.
//!
//! # Design
//!
//! [`PipelineRunner`] binds one repository, foundation and control plane.
//! Each sequence starts with a confirmation and returns `Ok(false)` when it
//! is declined. Under dry run every step is logged as `[DRY RUN] Would ...`
//! and skipped; confirmations are not asked.
//!
//! # Example
//!
//! ```ignore
//! let runner = PipelineRunner::new(&repo, "cml-k8s-n-01", &fly, &prompter)
//!     .with_release_target("tkgi-pipeline-upgrade");
//! if runner.run_release_pipeline(&git, "Release notes")? {
//!     runner.run_set_release_pipeline("develop", "master")?;
//! }
//! ```

use std::path::{Path, PathBuf};

use tracing::info;

use super::ReleaseError;
use crate::ci::{PipelineError, Pipelines};
use crate::core::config::DEFAULT_RELEASE_TARGET;
use crate::core::naming::{PipelineNames, RepoRef};
use crate::git::Git;
use crate::ui::prompts::Prompter;

/// Runs pipeline sequences for one repository on one foundation.
pub struct PipelineRunner<'a> {
    repo: &'a RepoRef,
    names: PipelineNames,
    foundation: String,
    release_target: String,
    ci: &'a dyn Pipelines,
    prompter: &'a dyn Prompter,
    dry_run: bool,
}

impl<'a> PipelineRunner<'a> {
    pub fn new(
        repo: &'a RepoRef,
        foundation: &str,
        ci: &'a dyn Pipelines,
        prompter: &'a dyn Prompter,
    ) -> Self {
        Self {
            repo,
            names: PipelineNames::new(&repo.name, &repo.owner, foundation),
            foundation: foundation.to_string(),
            release_target: DEFAULT_RELEASE_TARGET.to_string(),
            ci,
            prompter,
            dry_run: false,
        }
    }

    /// Target on which release pipelines run.
    pub fn with_release_target(mut self, target: &str) -> Self {
        self.release_target = target.to_string();
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn names(&self) -> &PipelineNames {
        &self.names
    }

    pub fn foundation(&self) -> &str {
        &self.foundation
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Confirm, unless dry run.
    fn confirm(&self, message: &str) -> Result<bool, ReleaseError> {
        if self.dry_run {
            return Ok(true);
        }
        Ok(self.prompter.confirm(message)?)
    }

    /// Run `step` unless dry run, in which case log `would`.
    fn step(
        &self,
        would: impl FnOnce() -> String,
        step: impl FnOnce() -> Result<(), PipelineError>,
    ) -> Result<(), ReleaseError> {
        if self.dry_run {
            info!("[DRY RUN] Would {}", would());
            return Ok(());
        }
        Ok(step()?)
    }

    /// Pick the pipeline-definition script in the repository's CI dir.
    ///
    /// One candidate is used as is; several are put to the operator.
    pub fn select_script(&self) -> Result<PathBuf, ReleaseError> {
        let ci_dir = self.repo.ci_dir();
        if !ci_dir.is_dir() {
            return Err(PipelineError::NoCiDir { path: ci_dir }.into());
        }

        let mut scripts = self.ci.find_fly_scripts(&ci_dir)?;
        match scripts.len() {
            0 => Err(PipelineError::NoScript { dir: ci_dir }.into()),
            1 => Ok(scripts.remove(0)),
            _ => {
                let names: Vec<String> = scripts.iter().map(|s| display_name(s)).collect();
                let choice = self
                    .prompter
                    .select("Multiple fly scripts found. Please choose one:", &names)?;
                Ok(scripts.remove(choice))
            }
        }
    }

    fn run_script(&self, args: Vec<String>) -> Result<(), ReleaseError> {
        let ci_dir = self.repo.ci_dir();
        let script = self.select_script()?;
        self.step(
            || format!("run {} {}", display_name(&script), args.join(" ")),
            || self.ci.run_fly_script(&script, &args, &ci_dir),
        )
    }

    /// Fly the release pipeline and drive `create-final-release`.
    pub fn run_release_pipeline(&self, git: &Git, release_body: &str) -> Result<bool, ReleaseError> {
        let pipeline = &self.names.release;
        info!("Running {} pipeline...", pipeline);
        if !self.confirm("Do you want to continue?")? {
            return Ok(false);
        }

        self.run_script(release_script_args(
            &self.foundation,
            release_body,
            &self.repo.owner,
            pipeline,
        ))?;

        self.drive_create_final_release()?;

        if self.dry_run {
            info!("[DRY RUN] Would pull {}", self.repo.canonical_name);
        } else {
            self.prompter.pause("Press enter to continue")?;
            git.pull_all()?;
        }
        Ok(true)
    }

    /// Fly the release pipeline, then offer to run `create-final-release`.
    ///
    /// Returns whether the job was run.
    pub fn fly_release_pipeline(&self, release_body: &str) -> Result<bool, ReleaseError> {
        let pipeline = &self.names.release;
        self.run_script(release_script_args(
            &self.foundation,
            release_body,
            &self.repo.owner,
            pipeline,
        ))?;
        if !self.confirm(&format!("Do you want to run the {} pipeline?", pipeline))? {
            return Ok(false);
        }
        self.drive_create_final_release()?;
        Ok(true)
    }

    fn drive_create_final_release(&self) -> Result<(), ReleaseError> {
        let pipeline = &self.names.release;
        let target = &self.release_target;
        let job = self.names.create_final_release_job();
        self.step(
            || format!("unpause {} on {}", pipeline, target),
            || self.ci.unpause_pipeline(target, pipeline),
        )?;
        self.step(
            || format!("trigger {} on {}", job, target),
            || self.ci.trigger_job(target, &job, false),
        )?;
        self.step(
            || format!("watch {} on {}", job, target),
            || self.ci.watch_job(target, &job),
        )
    }

    /// Destroy the release pipeline so it can be flown from scratch.
    pub fn recreate_release_pipeline(&self) -> Result<bool, ReleaseError> {
        if !self.confirm("Do you want to recreate the release pipeline?")? {
            return Ok(false);
        }
        let pipeline = &self.names.release;
        let target = &self.release_target;
        self.step(
            || format!("destroy {} on {}", pipeline, target),
            || self.ci.destroy_pipeline(target, pipeline),
        )?;
        Ok(true)
    }

    /// Fly and run the set-release pipeline on the foundation.
    ///
    /// `branch` and `params_branch` are the branches the pipeline tracks in
    /// the repository and the params repository.
    pub fn run_set_release_pipeline(
        &self,
        branch: &str,
        params_branch: &str,
    ) -> Result<bool, ReleaseError> {
        let pipeline = &self.names.set_release;
        info!("Running {} pipeline...", pipeline);
        if !self.confirm("Do you want to continue?")? {
            return Ok(false);
        }

        self.run_script(set_release_script_args(
            &self.foundation,
            pipeline,
            branch,
            params_branch,
            &self.repo.owner,
            &self.names.management,
        ))?;

        let job = self.names.set_release_job();
        self.step(
            || format!("unpause {} on {}", pipeline, self.foundation),
            || self.ci.unpause_pipeline(&self.foundation, pipeline),
        )?;
        self.step(
            || format!("trigger {} on {} and watch it", job, self.foundation),
            || self.ci.trigger_job(&self.foundation, &job, true),
        )?;

        if !self.dry_run {
            self.prompter.pause("Press enter to continue")?;
        }
        Ok(true)
    }

    /// Offer to run `prepare-kustomizations` on the management pipeline,
    /// unpausing the pipeline first when `unpause` is set.
    pub fn run_prepare_kustomizations(&self, unpause: bool) -> Result<bool, ReleaseError> {
        let pipeline = &self.names.management;
        if !self.confirm(&format!("Do you want to run the {} pipeline?", pipeline))? {
            return Ok(false);
        }
        self.trigger_prepare_kustomizations(unpause)
    }

    fn trigger_prepare_kustomizations(&self, unpause: bool) -> Result<bool, ReleaseError> {
        let pipeline = &self.names.management;
        let job = self.names.prepare_kustomizations_job();
        if unpause {
            self.step(
                || format!("unpause {} on {}", pipeline, self.foundation),
                || self.ci.unpause_pipeline(&self.foundation, pipeline),
            )?;
        }
        self.step(
            || format!("trigger {} on {} and watch it", job, self.foundation),
            || self.ci.trigger_job(&self.foundation, &job, true),
        )?;
        Ok(true)
    }

    /// Refly the management pipeline back to `branch`, then offer a rerun.
    pub fn refly_pipeline(&self, branch: &str) -> Result<bool, ReleaseError> {
        let pipeline = &self.names.management;
        if !self.confirm(&format!(
            "Do you want to refly the {} pipeline back to latest code on branch: {}?",
            pipeline, branch
        ))? {
            return Ok(false);
        }

        self.run_script(refly_script_args(&self.foundation, branch, pipeline))?;

        if self.confirm(&format!("Do you want to rerun the {} pipeline?", pipeline))? {
            self.trigger_prepare_kustomizations(true)?;
        }
        Ok(true)
    }
}

/// `-f <foundation> -r <body> -o <owner> -p <pipeline>`
pub fn release_script_args(foundation: &str, body: &str, owner: &str, pipeline: &str) -> Vec<String> {
    ["-f", foundation, "-r", body, "-o", owner, "-p", pipeline]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// `-f <foundation> -s <set pipeline> -b <branch> -d <params branch> -o <owner> -p <pipeline>`
pub fn set_release_script_args(
    foundation: &str,
    set_pipeline: &str,
    branch: &str,
    params_branch: &str,
    owner: &str,
    pipeline: &str,
) -> Vec<String> {
    [
        "-f",
        foundation,
        "-s",
        set_pipeline,
        "-b",
        branch,
        "-d",
        params_branch,
        "-o",
        owner,
        "-p",
        pipeline,
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// `-f <foundation> -b <branch> -p <pipeline>`
pub fn refly_script_args(foundation: &str, branch: &str, pipeline: &str) -> Vec<String> {
    ["-f", foundation, "-b", branch, "-p", pipeline]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
