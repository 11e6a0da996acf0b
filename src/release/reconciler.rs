//! release::reconciler
//!
//! Propagate a repository's latest release into the params repository.
//!
//! # Algorithm
//!
//! 1. Refresh the source repository and collect its release tags
//! 2. Compute the [`VersionDelta`] (the two highest release versions)
//! 3. Confirm the delta with the operator
//! 4. Refuse a dirty params working copy, then refresh it
//! 5. Plan the `git_release_tag` rewrites; refuse untracked planned files
//! 6. Write the rewrites, show status and diff, confirm again (decline puts
//!    back the original contents)
//! 7. Commit the rewritten files on `<repo>-release-v<to>`, rebase it into
//!    the params mainline, push, delete the branch
//! 8. Tag the params commit `<repo>-release-v<to>` and push the tag
//!
//! # Outcomes
//!
//! Declines are a [`ReconcileOutcome::Declined`], not an error. Running again
//! with no new tags finds nothing to rewrite and the params tag on origin,
//! and returns [`ReconcileOutcome::AlreadyCurrent`]. A local tag that never
//! reached origin is pushed rather than trusted.
//!
//! Only planned files are staged; other files in the params working copy
//! are left alone. The source repository is only ever fetched from.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use super::params::{
    apply_rewrites, plan_rewrites, release_tag_line, restore_rewrites, Rewrite,
};
use crate::core::config::DEFAULT_PARAMS_BRANCH;
use crate::core::naming::{params_branch_name, params_tag_name, RepoRef};
use crate::core::types::{VersionDelta, DEFAULT_TAG_PREFIX};
use crate::git::{Git, GitError};
use crate::ui::output::print_block;
use crate::ui::prompts::{PromptError, Prompter};

/// Errors from reconciliation.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// No tag in the source repository parses as a release tag.
    #[error("no release tags found in {path}; make sure to fly the release pipeline")]
    NoReleaseTags { path: PathBuf },

    /// The params working copy has local modifications, or a file that
    /// would be rewritten is untracked.
    #[error("please commit or stash your changes to {path}")]
    DirtyWorkingTree { path: PathBuf },

    /// A params file could not be read or written.
    #[error("failed to update release tag in {path}: {source}")]
    FileRewrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    VersionControl(#[from] GitError),

    #[error(transparent)]
    Prompt(#[from] PromptError),
}

impl ReconcileError {
    /// Failures that leave nothing half-done and need operator action,
    /// as opposed to an external command failing mid-flight.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ReconcileError::NoReleaseTags { .. }
                | ReconcileError::DirtyWorkingTree { .. }
                | ReconcileError::FileRewrite { .. }
        )
    }
}

/// What a reconciliation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Params rewritten (when anything referenced the old tag) and tagged.
    Applied(VersionDelta),
    /// Nothing to rewrite and the params tag already exists.
    AlreadyCurrent(VersionDelta),
    /// The operator declined a confirmation.
    Declined,
    /// Dry run; nothing was touched.
    DryRun(VersionDelta),
}

impl ReconcileOutcome {
    /// Whether the params repo now pins the latest release.
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            ReconcileOutcome::Applied(_) | ReconcileOutcome::AlreadyCurrent(_)
        )
    }
}

/// Reconciliation settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileOptions {
    /// Release tag prefix in the source repository.
    pub tag_prefix: String,
    /// Params mainline branch.
    pub params_branch: String,
    pub dry_run: bool,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            tag_prefix: DEFAULT_TAG_PREFIX.to_string(),
            params_branch: DEFAULT_PARAMS_BRANCH.to_string(),
            dry_run: false,
        }
    }
}

/// Reconciles one repository against its params repository.
pub struct Reconciler<'a> {
    repo: &'a RepoRef,
    params: &'a RepoRef,
    prompter: &'a dyn Prompter,
    options: ReconcileOptions,
}

impl<'a> Reconciler<'a> {
    pub fn new(
        repo: &'a RepoRef,
        params: &'a RepoRef,
        prompter: &'a dyn Prompter,
        options: ReconcileOptions,
    ) -> Self {
        Self {
            repo,
            params,
            prompter,
            options,
        }
    }

    /// Compute the delta from the source repository's tags.
    pub fn version_delta(&self, source: &Git) -> Result<VersionDelta, ReconcileError> {
        let tags = source.list_tags()?;
        VersionDelta::from_tags(&tags, &self.options.tag_prefix).ok_or_else(|| {
            ReconcileError::NoReleaseTags {
                path: self.repo.path.clone(),
            }
        })
    }

    /// Run the reconciliation.
    pub fn reconcile(&self) -> Result<ReconcileOutcome, ReconcileError> {
        let source = Git::open(&self.repo.path)?;
        if !self.options.dry_run {
            source.pull_all()?;
        }
        let delta = self.version_delta(&source)?;

        info!(
            "Updating the {} for the tkgi-{} pipeline from {}",
            self.params.canonical_name, self.repo.canonical_name, delta
        );

        let params = Git::open(&self.params.path)?;
        if self.options.dry_run {
            return self.dry_run(delta);
        }

        if !self.prompter.confirm("Do you want to continue?")? {
            info!("Params update cancelled");
            return Ok(ReconcileOutcome::Declined);
        }

        if params.has_uncommitted_changes()? {
            return Err(ReconcileError::DirtyWorkingTree {
                path: self.params.path.clone(),
            });
        }
        params.checkout(&self.options.params_branch)?;
        params.pull_all()?;

        let plan = self.plan(&delta)?;
        let tag = params_tag_name(&self.repo.name, &delta.to);

        if plan.is_empty() {
            if params.remote_tag_exists("origin", &tag)? {
                info!("{} already pins {}", self.params.canonical_name, tag);
                return Ok(ReconcileOutcome::AlreadyCurrent(delta));
            }
            info!(
                "No params file references {}; tagging only",
                release_tag_line(&delta.from)
            );
            if !self
                .prompter
                .confirm(&format!("Do you want to create the {} tag?", tag))?
            {
                return Ok(ReconcileOutcome::Declined);
            }
            self.push_params_tag(&params, &tag)?;
            return Ok(ReconcileOutcome::Applied(delta));
        }

        let paths = self.planned_paths(&plan);
        self.refuse_untracked(&params, &paths)?;

        apply_rewrites(&plan)
            .map_err(|(path, source)| ReconcileError::FileRewrite { path, source })?;

        print_block(&params.status_text()?);
        print_block(&params.diff_text()?);

        if !self
            .prompter
            .confirm("Do you want to continue with these commits?")?
        {
            restore_rewrites(&plan)
                .map_err(|(path, source)| ReconcileError::FileRewrite { path, source })?;
            info!("Discarded params changes");
            return Ok(ReconcileOutcome::Declined);
        }

        let branch = params_branch_name(&self.repo.name, &delta.to);
        self.merge_into_mainline(&params, &branch, &commit_message(&delta), &paths)?;
        params.create_and_push_tag(&tag, &format!("Version {}", tag))?;
        info!("Tagged {} as {}", self.params.canonical_name, tag);

        Ok(ReconcileOutcome::Applied(delta))
    }

    fn dry_run(&self, delta: VersionDelta) -> Result<ReconcileOutcome, ReconcileError> {
        let plan = self.plan(&delta)?;
        if plan.is_empty() {
            info!(
                "[DRY RUN] No params file references {}",
                release_tag_line(&delta.from)
            );
        }
        for rewrite in &plan {
            info!("[DRY RUN] Would update {}", rewrite.path.display());
        }
        let tag = params_tag_name(&self.repo.name, &delta.to);
        info!("[DRY RUN] Would tag {} as {}", self.params.canonical_name, tag);
        Ok(ReconcileOutcome::DryRun(delta))
    }

    fn plan(&self, delta: &VersionDelta) -> Result<Vec<Rewrite>, ReconcileError> {
        let plan = plan_rewrites(&self.params.path, &self.repo.name, &delta.from, &delta.to)
            .map_err(|(path, source)| ReconcileError::FileRewrite { path, source })?;
        debug!("{} params file(s) to rewrite", plan.len());
        Ok(plan)
    }

    /// Planned files relative to the params root.
    fn planned_paths<'p>(&self, plan: &'p [Rewrite]) -> Vec<&'p Path> {
        plan.iter()
            .map(|r| r.path.strip_prefix(&self.params.path).unwrap_or(r.path.as_path()))
            .collect()
    }

    /// Every planned file must already be tracked in the params repository.
    fn refuse_untracked(&self, params: &Git, paths: &[&Path]) -> Result<(), ReconcileError> {
        let untracked = params.untracked_files()?;
        if let Some(path) = paths.iter().find(|p| untracked.iter().any(|u| u.as_path() == **p)) {
            warn!("{} is not tracked", path.display());
            return Err(ReconcileError::DirtyWorkingTree {
                path: self.params.path.clone(),
            });
        }
        Ok(())
    }

    /// Push the params tag for a tag-only run, creating it unless a local
    /// tag of that name is already waiting to be pushed.
    fn push_params_tag(&self, params: &Git, tag: &str) -> Result<(), ReconcileError> {
        if params.tag_exists(tag) {
            info!("Pushing existing local tag {}", tag);
            params.push_tag(tag)?;
        } else {
            params.create_and_push_tag(tag, &format!("Version {}", tag))?;
        }
        Ok(())
    }

    fn merge_into_mainline(
        &self,
        params: &Git,
        branch: &str,
        message: &str,
        paths: &[&Path],
    ) -> Result<(), ReconcileError> {
        let mainline = self.options.params_branch.as_str();
        params.create_branch(branch, None)?;

        let merged = params
            .add_paths(paths)
            .and_then(|_| params.commit(message))
            .and_then(|_| params.checkout(mainline))
            .and_then(|_| params.pull_branch("origin", mainline))
            .and_then(|_| params.rebase(branch))
            .and_then(|_| params.push("origin", mainline));

        if let Err(e) = merged {
            warn!("Params update failed, cleaning up {}", branch);
            if let Err(cleanup) = params
                .checkout(mainline)
                .and_then(|_| params.delete_branch(branch))
            {
                warn!("Cleanup of {} failed: {}", branch, cleanup);
            }
            return Err(e.into());
        }

        params.delete_branch(branch)?;
        Ok(())
    }
}

/// `Update git_release_tag from release-vA to release-vB`, exempt from ticketing.
pub fn commit_message(delta: &VersionDelta) -> String {
    format!(
        "Update git_release_tag from release-{} to release-{}\n\nNOTICKET",
        delta.from_ref(),
        delta.to_ref()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::ReleaseVersion;

    fn delta(from: &str, to: &str) -> VersionDelta {
        VersionDelta {
            from: from.parse::<ReleaseVersion>().unwrap(),
            to: to.parse::<ReleaseVersion>().unwrap(),
        }
    }

    #[test]
    fn commit_message_shape() {
        assert_eq!(
            commit_message(&delta("1.0.0", "1.1.0")),
            "Update git_release_tag from release-v1.0.0 to release-v1.1.0\n\nNOTICKET"
        );
    }

    #[test]
    fn outcome_success() {
        assert!(ReconcileOutcome::Applied(delta("1.0.0", "1.1.0")).is_success());
        assert!(ReconcileOutcome::AlreadyCurrent(delta("1.0.0", "1.1.0")).is_success());
        assert!(!ReconcileOutcome::Declined.is_success());
        assert!(!ReconcileOutcome::DryRun(delta("1.0.0", "1.1.0")).is_success());
    }

    #[test]
    fn recoverable_errors() {
        assert!(ReconcileError::NoReleaseTags {
            path: PathBuf::from("/x")
        }
        .is_recoverable());
        assert!(ReconcileError::DirtyWorkingTree {
            path: PathBuf::from("/x")
        }
        .is_recoverable());
        assert!(!ReconcileError::VersionControl(GitError::BareRepo).is_recoverable());
        assert!(!ReconcileError::Prompt(PromptError::Cancelled).is_recoverable());
    }

    #[test]
    fn default_options() {
        let options = ReconcileOptions::default();
        assert_eq!(options.tag_prefix, "release-v");
        assert_eq!(options.params_branch, "master");
        assert!(!options.dry_run);
    }
}
