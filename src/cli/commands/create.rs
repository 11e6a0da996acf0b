//! create-release command - Cut a release end to end

use anyhow::{Context as _, Result};
use tracing::info;

use super::{fly, prompter, resolve, resolve_params};
use crate::cli::args::{Assume, RepoArgs};
use crate::cli::Context;
use crate::core::types::DEFAULT_TAG_PREFIX;
use crate::release::create::{CreateOptions, CreateRelease};

/// Run the release pipeline, pin the release in params and set it on
/// `foundation`.
pub fn create_release(
    ctx: &Context,
    foundation: &str,
    repo_args: &RepoArgs,
    message: &str,
    params_repo: Option<&str>,
    dry_run: bool,
) -> Result<()> {
    let repo = resolve(ctx, repo_args);
    let params = resolve_params(ctx, repo_args, params_repo);
    let fly = fly(ctx, dry_run)?;
    let prompter = prompter(ctx, Assume::No);

    let workflow = CreateRelease {
        repo: &repo,
        params: &params,
        ci: &fly,
        prompter: prompter.as_ref(),
        release_target: ctx.config.release_target().to_string(),
    };
    let options = CreateOptions {
        foundation: foundation.to_string(),
        release_body: message.to_string(),
        params_branch: ctx.config.params_branch().to_string(),
        tag_prefix: DEFAULT_TAG_PREFIX.to_string(),
        dry_run,
    };

    let completed = workflow
        .run(&options)
        .with_context(|| format!("Failed to release {}", repo.canonical_name))?;
    if completed {
        info!("Release of {} complete", repo.canonical_name);
    }
    Ok(())
}
