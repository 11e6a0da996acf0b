//! demo-pipeline command - Replay a release end to end

use anyhow::{Context as _, Result};

use super::{fly, prompter, registry, resolve, resolve_params, runtime};
use crate::cli::args::{Assume, RepoArgs};
use crate::cli::Context;
use crate::core::types::DEFAULT_TAG_PREFIX;
use crate::release::demo::{DemoOptions, DemoPipeline};

/// Mainline of the repositories being demoed.
const DEMO_MAINLINE: &str = "master";

/// Parsed `demo-pipeline` flags.
#[derive(Debug)]
pub struct DemoArgs {
    pub foundation: String,
    pub repo: RepoArgs,
    pub branch: Option<String>,
    pub params_repo: Option<String>,
    pub params_branch: Option<String>,
    pub tag: Option<String>,
    pub message: String,
    pub dry_run: bool,
}

pub fn demo_pipeline(ctx: &Context, args: DemoArgs) -> Result<()> {
    let repo = resolve(ctx, &args.repo);
    let params = resolve_params(ctx, &args.repo, args.params_repo.as_deref());
    repo.ensure_exists()?;
    params.ensure_exists()?;

    let registry = registry(ctx, &repo)?;
    let fly = fly(ctx, args.dry_run)?;
    let prompter = prompter(ctx, Assume::No);

    let demo = DemoPipeline {
        repo: &repo,
        params: &params,
        registry: &registry,
        ci: &fly,
        prompter: prompter.as_ref(),
        release_target: ctx.config.release_target().to_string(),
    };
    let options = DemoOptions {
        foundation: args.foundation,
        branch: args.branch,
        release_tag: args.tag,
        release_body: args.message,
        params_branch: args
            .params_branch
            .unwrap_or_else(|| ctx.config.params_branch().to_string()),
        mainline: DEMO_MAINLINE.to_string(),
        tag_prefix: DEFAULT_TAG_PREFIX.to_string(),
        dry_run: args.dry_run,
    };

    runtime()?
        .block_on(demo.run(&options))
        .with_context(|| format!("Demo pipeline for {} failed", repo.canonical_name))
}
