//! rollback-release command - Set a foundation back to an older release

use anyhow::{Context as _, Result};

use super::{fly, prompter, resolve, resolve_params};
use crate::cli::args::{Assume, RepoArgs};
use crate::cli::Context;
use crate::core::types::DEFAULT_TAG_PREFIX;
use crate::git::Git;
use crate::release::pipelines::PipelineRunner;
use crate::release::rollback::{self, RollbackOptions};

pub fn rollback_release(
    ctx: &Context,
    foundation: &str,
    repo_args: &RepoArgs,
    release: &str,
    params_repo: Option<&str>,
    dry_run: bool,
) -> Result<()> {
    let repo = resolve(ctx, repo_args);
    let params = resolve_params(ctx, repo_args, params_repo);
    repo.ensure_exists()?;
    params.ensure_exists()?;
    let repo_git = Git::open(&repo.path)?;
    let params_git = Git::open(&params.path)?;

    let fly = fly(ctx, dry_run)?;
    let prompter = prompter(ctx, Assume::No);
    let runner = PipelineRunner::new(&repo, foundation, &fly, prompter.as_ref())
        .with_release_target(ctx.config.release_target())
        .with_dry_run(dry_run);

    let options = RollbackOptions {
        release: release.to_string(),
        tag_prefix: DEFAULT_TAG_PREFIX.to_string(),
    };
    rollback::rollback_release(&runner, &repo_git, &params_git, &repo.name, &options)
        .with_context(|| format!("Failed to roll back {} to {}", repo.canonical_name, release))?;
    Ok(())
}
