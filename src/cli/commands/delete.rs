//! delete-release command - Delete a GitHub release and its git tag

use anyhow::{Context as _, Result};

use super::{prompter, registry, resolve, runtime};
use crate::cli::args::{Assume, RepoArgs};
use crate::cli::Context;
use crate::git::Git;
use crate::release::deletion::{self, DeletionOptions};

/// Delete the release attached to `tag`.
///
/// `--non-interactive` answers yes unless `--assume no` is given.
pub fn delete_release(
    ctx: &Context,
    repo_args: &RepoArgs,
    tag: &str,
    delete_git_tag: bool,
    dry_run: bool,
) -> Result<()> {
    let repo = resolve(ctx, repo_args);
    repo.ensure_exists()?;
    let git = Git::open(&repo.path)
        .with_context(|| format!("{} is not a git repository", repo.canonical_name))?;
    let registry = registry(ctx, &repo)?;
    let prompter = prompter(ctx, Assume::Yes);

    let options = DeletionOptions {
        tag: tag.to_string(),
        delete_git_tag,
        dry_run,
    };
    runtime()?
        .block_on(deletion::delete_release(
            &registry,
            &git,
            prompter.as_ref(),
            &options,
        ))
        .with_context(|| format!("Failed to delete release {}", tag))?;
    Ok(())
}
