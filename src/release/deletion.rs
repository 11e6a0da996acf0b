//! release::deletion
//!
//! Delete a registry release and, optionally, its git tag.
//!
//! A release that does not exist is reported together with the releases that
//! do, and is not an error. Registry failures (auth, network, API) are.

use tracing::{error, info};

use super::ReleaseError;
use crate::git::Git;
use crate::registry::ReleaseRegistry;
use crate::ui::prompts::Prompter;

/// What happened to the registry release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseState {
    Deleted,
    NotFound,
    Declined,
    DryRun,
}

/// Result of a deletion run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeletionReport {
    pub release: ReleaseState,
    pub tag_deleted: bool,
}

/// Options for [`delete_release`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionOptions {
    pub tag: String,
    /// Also delete the git tag, locally and on origin.
    pub delete_git_tag: bool,
    pub dry_run: bool,
}

/// Delete the release attached to `options.tag`.
pub async fn delete_release(
    registry: &dyn ReleaseRegistry,
    git: &Git,
    prompter: &dyn Prompter,
    options: &DeletionOptions,
) -> Result<DeletionReport, ReleaseError> {
    let tag = options.tag.as_str();

    let state = match registry.find_release_by_tag(tag).await? {
        None => {
            let releases = registry.list_releases().await?;
            if releases.is_empty() {
                info!("No releases found");
            } else {
                error!("Release {} not found", tag);
                info!("Available Github Releases:");
                for release in &releases {
                    info!("{} - {}", release.tag_name, release.display_name());
                }
            }
            ReleaseState::NotFound
        }
        Some(release) => {
            if options.dry_run {
                info!(
                    "[DRY RUN] Would delete {} release {} (id {})",
                    registry.name(),
                    tag,
                    release.id
                );
                ReleaseState::DryRun
            } else if !prompter.confirm(&format!(
                "Are you sure you want to delete github release: {}?",
                tag
            ))? {
                return Ok(DeletionReport {
                    release: ReleaseState::Declined,
                    tag_deleted: false,
                });
            } else {
                registry.delete_release(release.id).await?;
                info!("Deleted GitHub release: {}", tag);
                ReleaseState::Deleted
            }
        }
    };

    let tag_deleted = if options.delete_git_tag {
        delete_git_tag(git, prompter, tag, options.dry_run)?
    } else {
        false
    };

    Ok(DeletionReport {
        release: state,
        tag_deleted,
    })
}

/// Delete a git tag locally and on origin after confirmation.
///
/// A missing tag is reported and returns `Ok(false)`.
pub fn delete_git_tag(
    git: &Git,
    prompter: &dyn Prompter,
    tag: &str,
    dry_run: bool,
) -> Result<bool, ReleaseError> {
    if !git.tag_exists(tag) {
        error!("Git tag {} not found in repository", tag);
        return Ok(false);
    }
    if dry_run {
        info!("[DRY RUN] Would delete git tag {}", tag);
        return Ok(false);
    }
    if !prompter.confirm(&format!("Would you like to delete the git tag: {}?", tag))? {
        return Ok(false);
    }
    git.delete_tag(tag)?;
    info!("Deleted git tag: {}", tag);
    Ok(true)
}
