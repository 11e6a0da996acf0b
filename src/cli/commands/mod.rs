//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Resolves repositories from flags and configuration
//! 2. Builds the gateways the workflow needs
//! 3. Runs the workflow and reports its outcome
//!
//! # Async Commands
//!
//! Commands that talk to the GitHub API (delete-release, demo-pipeline) run
//! their workflow on a current-thread tokio runtime via `block_on`.

mod completion;
mod create;
mod delete;
mod demo;
mod rollback;
mod update_params;

pub use completion::completion;
pub use create::create_release;
pub use delete::delete_release;
pub use demo::demo_pipeline;
pub use rollback::rollback_release;
pub use update_params::update_params_tag;

use std::path::PathBuf;

use anyhow::{Context as _, Result};

use super::args::{Assume, Command, RepoArgs};
use super::Context;
use crate::ci::fly::{Fly, FLY_EXECUTABLE};
use crate::core::naming::{resolve_repo, RepoRef};
use crate::registry::github::GitHubRegistry;
use crate::ui::prompts::{PolicyPrompter, Prompter, TerminalPrompter};

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::CreateRelease {
            foundation,
            repo,
            message,
            params_repo,
            dry_run,
        } => create::create_release(
            ctx,
            &foundation,
            &repo,
            &message,
            params_repo.as_deref(),
            dry_run,
        ),
        Command::DeleteRelease {
            repo,
            tag,
            no_tag_deletion,
            dry_run,
        } => delete::delete_release(ctx, &repo, &tag, !no_tag_deletion, dry_run),
        Command::RollbackRelease {
            foundation,
            repo,
            release,
            params_repo,
            dry_run,
        } => rollback::rollback_release(
            ctx,
            &foundation,
            &repo,
            &release,
            params_repo.as_deref(),
            dry_run,
        ),
        Command::UpdateParamsTag {
            repo,
            params_repo,
            params_branch,
            tag_prefix,
            dry_run,
        } => update_params::update_params_tag(
            ctx,
            &repo,
            params_repo.as_deref(),
            params_branch.as_deref(),
            &tag_prefix,
            dry_run,
        ),
        Command::DemoPipeline {
            foundation,
            repo,
            branch,
            params_repo,
            params_branch,
            tag,
            message,
            dry_run,
        } => demo::demo_pipeline(
            ctx,
            demo::DemoArgs {
                foundation,
                repo,
                branch,
                params_repo,
                params_branch,
                tag,
                message,
                dry_run,
            },
        ),
        Command::Completion { shell } => completion::completion(shell),
    }
}

// =============================================================================
// Shared handler helpers
// =============================================================================

fn owner(ctx: &Context, args: &RepoArgs) -> String {
    args.owner
        .clone()
        .unwrap_or_else(|| ctx.config.owner().to_string())
}

fn workspace(ctx: &Context, args: &RepoArgs) -> PathBuf {
    args.workspace
        .clone()
        .unwrap_or_else(|| ctx.config.workspace())
}

/// The repository named by `-r`, resolved against owner and workspace.
fn resolve(ctx: &Context, args: &RepoArgs) -> RepoRef {
    resolve_repo(&args.repo, &owner(ctx, args), &workspace(ctx, args))
}

/// The params repository for the same owner and workspace.
fn resolve_params(ctx: &Context, args: &RepoArgs, params_repo: Option<&str>) -> RepoRef {
    let name = params_repo.unwrap_or_else(|| ctx.config.params_repo());
    resolve_repo(name, &owner(ctx, args), &workspace(ctx, args))
}

/// Terminal prompts, or the non-interactive policy.
fn prompter(ctx: &Context, default: Assume) -> Box<dyn Prompter> {
    match ctx.policy(default) {
        None => Box::new(TerminalPrompter::stdio()),
        Some(Assume::Yes) => Box::new(PolicyPrompter::assume_yes()),
        Some(Assume::No) => Box::new(PolicyPrompter::assume_no()),
    }
}

/// The `fly` control plane. A dry run never executes it, so a missing
/// executable is tolerated there.
fn fly(ctx: &Context, dry_run: bool) -> Result<Fly> {
    let script = ctx.config.fly_script().map(|p| p.to_path_buf());
    match Fly::locate(ctx.config.fly_path(), script.clone()) {
        Ok(fly) => Ok(fly),
        Err(_) if dry_run => Ok(Fly::with_executable(PathBuf::from(FLY_EXECUTABLE), script)),
        Err(e) => Err(e).context("Cannot run Concourse commands"),
    }
}

/// GitHub releases of `repo`.
fn registry(ctx: &Context, repo: &RepoRef) -> Result<GitHubRegistry> {
    let token = ctx.config.github_token()?;
    Ok(GitHubRegistry::with_api_base(
        token,
        &repo.owner,
        &repo.canonical_name,
        ctx.config.github_api_url(),
    ))
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")
}
