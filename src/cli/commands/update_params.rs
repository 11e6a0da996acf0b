//! update-params-tag command - Pin the latest release in params

use anyhow::{Context as _, Result};
use tracing::info;

use super::{prompter, resolve, resolve_params};
use crate::cli::args::{Assume, RepoArgs};
use crate::cli::Context;
use crate::release::{ReconcileOptions, ReconcileOutcome, Reconciler};

pub fn update_params_tag(
    ctx: &Context,
    repo_args: &RepoArgs,
    params_repo: Option<&str>,
    params_branch: Option<&str>,
    tag_prefix: &str,
    dry_run: bool,
) -> Result<()> {
    let repo = resolve(ctx, repo_args);
    let params = resolve_params(ctx, repo_args, params_repo);
    repo.ensure_exists()?;
    params.ensure_exists()?;

    let prompter = prompter(ctx, Assume::No);
    let options = ReconcileOptions {
        tag_prefix: tag_prefix.to_string(),
        params_branch: params_branch
            .unwrap_or_else(|| ctx.config.params_branch())
            .to_string(),
        dry_run,
    };

    let outcome = Reconciler::new(&repo, &params, prompter.as_ref(), options).reconcile();
    match outcome {
        Ok(ReconcileOutcome::Applied(delta)) => {
            info!("{} now pins {} {}", params.canonical_name, repo.name, delta.to_ref());
        }
        Ok(ReconcileOutcome::AlreadyCurrent(delta)) => {
            info!("{} already pins {} {}", params.canonical_name, repo.name, delta.to_ref());
        }
        Ok(ReconcileOutcome::DryRun(_)) => {}
        Ok(ReconcileOutcome::Declined) => info!("No changes made"),
        Err(e) => return Err(e).context("Failed to update git release tag"),
    }
    Ok(())
}
