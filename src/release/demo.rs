//! release::demo
//!
//! Replay a release end to end for a demo.
//!
//! # Sequence
//!
//! 1. Refuse a dirty working copy
//! 2. Resolve the branch (current by default) and release tag (highest by
//!    default)
//! 3. Delete the registry release for that tag
//! 4. Offer to rewind the `version` branch ([`super::reversion`])
//! 5. Offer to recreate the release pipeline, fly it, offer to run it
//! 6. Reconcile params; a failure asks whether to carry on
//! 7. Set-release pipeline, `prepare-kustomizations`, refly

use tracing::{error, info};

use super::pipelines::PipelineRunner;
use super::reconciler::{ReconcileOptions, ReconcileOutcome, Reconciler};
use super::reversion::VersionReversion;
use super::rollback::current_branch_or_head;
use super::ReleaseError;
use crate::ci::Pipelines;
use crate::core::naming::RepoRef;
use crate::core::types::sorted_release_tags;
use crate::git::{Git, GitError};
use crate::registry::ReleaseRegistry;
use crate::ui::prompts::Prompter;

/// Demo settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoOptions {
    pub foundation: String,
    /// Branch the pipelines track; the current branch when unset.
    pub branch: Option<String>,
    /// Release to replay; the highest release tag when unset.
    pub release_tag: Option<String>,
    pub release_body: String,
    pub params_branch: String,
    /// Source repository mainline, used to recreate the release branch.
    pub mainline: String,
    pub tag_prefix: String,
    pub dry_run: bool,
}

/// Collaborators for a demo run.
pub struct DemoPipeline<'a> {
    pub repo: &'a RepoRef,
    pub params: &'a RepoRef,
    pub registry: &'a dyn ReleaseRegistry,
    pub ci: &'a dyn Pipelines,
    pub prompter: &'a dyn Prompter,
    pub release_target: String,
}

impl DemoPipeline<'_> {
    pub async fn run(&self, options: &DemoOptions) -> Result<(), ReleaseError> {
        let git = Git::open(&self.repo.path)?;
        if git.has_uncommitted_changes()? {
            error!("Please commit or stash your changes before running this script");
            return Err(ReleaseError::DirtyRepo {
                path: self.repo.path.clone(),
            });
        }

        let branch = match &options.branch {
            Some(branch) => branch.clone(),
            None => current_branch_or_head(&git)?,
        };
        info!("Current branch: {}", branch);

        let release_tag = match &options.release_tag {
            Some(tag) => Some(tag.clone()),
            None => {
                info!("Getting latest release tag from {}...", self.repo.path.display());
                if !options.dry_run {
                    git.pull_all()?;
                }
                latest_release_tag(&git, &options.tag_prefix)?
            }
        };
        match &release_tag {
            Some(tag) => self.delete_registry_release(tag, options.dry_run).await?,
            None => info!("No release tags found in {}.", self.repo.path.display()),
        }

        VersionReversion::new(&git, self.prompter, &options.mainline, &options.tag_prefix)
            .with_dry_run(options.dry_run)
            .handle(&branch)?;

        let runner = PipelineRunner::new(self.repo, &options.foundation, self.ci, self.prompter)
            .with_release_target(&self.release_target)
            .with_dry_run(options.dry_run);

        runner.recreate_release_pipeline()?;
        runner.fly_release_pipeline(&options.release_body)?;
        if !options.dry_run {
            self.prompter.pause("Press enter to continue")?;
        }

        self.update_params(options)?;

        if runner.run_set_release_pipeline(&branch, &options.params_branch)? {
            runner.run_prepare_kustomizations(true)?;
        }
        runner.refly_pipeline(&branch)?;
        Ok(())
    }

    async fn delete_registry_release(&self, tag: &str, dry_run: bool) -> Result<(), ReleaseError> {
        let Some(release) = self.registry.find_release_by_tag(tag).await? else {
            return Ok(());
        };
        if dry_run {
            info!(
                "[DRY RUN] Would delete GitHub release {} for {}/{} (release_id: {})",
                tag, self.repo.owner, self.repo.canonical_name, release.id
            );
            return Ok(());
        }
        if !self
            .prompter
            .confirm(&format!("Do you want to delete github release: {}?", tag))?
        {
            return Ok(());
        }
        self.registry.delete_release(release.id).await?;
        info!(
            "Successfully deleted GitHub release {} for {}/{}",
            tag, self.repo.owner, self.repo.canonical_name
        );
        Ok(())
    }

    /// Reconcile params. Recoverable failures and declines ask whether to
    /// carry on; other errors propagate.
    fn update_params(&self, options: &DemoOptions) -> Result<(), ReleaseError> {
        let reconcile_options = ReconcileOptions {
            tag_prefix: options.tag_prefix.clone(),
            params_branch: options.params_branch.clone(),
            dry_run: options.dry_run,
        };
        let reconciler = Reconciler::new(self.repo, self.params, self.prompter, reconcile_options);

        let updated = match reconciler.reconcile() {
            Ok(outcome) => outcome.is_success() || matches!(outcome, ReconcileOutcome::DryRun(_)),
            Err(e) if e.is_recoverable() => {
                error!("{}", e);
                false
            }
            Err(e) => return Err(e.into()),
        };
        if updated {
            return Ok(());
        }

        error!("Failed to update git release tag");
        if self.prompter.confirm(
            "Failed to update params git release tag. Do you want to continue anyway?",
        )? {
            return Ok(());
        }
        info!("Exiting the pipeline process.");
        Err(ReleaseError::ParamsNotUpdated)
    }
}

/// Highest release tag in the working copy.
pub fn latest_release_tag(git: &Git, prefix: &str) -> Result<Option<String>, GitError> {
    Ok(sorted_release_tags(git.list_tags()?, prefix)
        .pop()
        .map(|tag| tag.name().to_string()))
}
