//! release::create
//!
//! Cut a release: run the release pipeline, pin the new release in params,
//! set the release pipeline on the foundation and refly the management
//! pipeline back to the working branch.

use tracing::{error, info};

use super::pipelines::PipelineRunner;
use super::reconciler::{ReconcileOptions, ReconcileOutcome, Reconciler};
use super::rollback::current_branch_or_head;
use super::ReleaseError;
use crate::ci::{PipelineError, Pipelines};
use crate::core::naming::RepoRef;
use crate::git::Git;
use crate::ui::prompts::Prompter;

/// Release settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateOptions {
    pub foundation: String,
    pub release_body: String,
    pub params_branch: String,
    pub tag_prefix: String,
    pub dry_run: bool,
}

/// Collaborators for a release.
pub struct CreateRelease<'a> {
    pub repo: &'a RepoRef,
    pub params: &'a RepoRef,
    pub ci: &'a dyn Pipelines,
    pub prompter: &'a dyn Prompter,
    pub release_target: String,
}

impl CreateRelease<'_> {
    /// Returns `Ok(false)` when the operator stopped the release.
    pub fn run(&self, options: &CreateOptions) -> Result<bool, ReleaseError> {
        self.repo.ensure_exists()?;
        self.params.ensure_exists()?;
        let ci_dir = self.repo.ci_dir();
        if !ci_dir.is_dir() {
            return Err(PipelineError::NoCiDir { path: ci_dir }.into());
        }
        if options.dry_run {
            info!("DRY RUN MODE - No changes will be made");
        }

        let git = Git::open(&self.repo.path)?;
        let runner = PipelineRunner::new(self.repo, &options.foundation, self.ci, self.prompter)
            .with_release_target(&self.release_target)
            .with_dry_run(options.dry_run);

        if !runner.run_release_pipeline(&git, &options.release_body)? {
            info!("Release cancelled");
            return Ok(false);
        }

        let reconciler = Reconciler::new(
            self.repo,
            self.params,
            self.prompter,
            ReconcileOptions {
                tag_prefix: options.tag_prefix.clone(),
                params_branch: options.params_branch.clone(),
                dry_run: options.dry_run,
            },
        );
        if reconciler.reconcile()? == ReconcileOutcome::Declined {
            error!("Failed to update git release tag");
            return Ok(false);
        }

        let params = Git::open(&self.params.path)?;
        let branch = current_branch_or_head(&git)?;
        let params_branch = current_branch_or_head(&params)?;
        if !runner.run_set_release_pipeline(&branch, &params_branch)? {
            return Ok(false);
        }
        runner.run_prepare_kustomizations(false)?;
        runner.refly_pipeline(&branch)?;
        Ok(true)
    }
}
