//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Warnings and errors only
//! - `--non-interactive` / `-n`: Never read from the terminal
//! - `--assume yes|no`: How to answer confirmations when non-interactive

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::core::types::DEFAULT_TAG_PREFIX;

/// Release management for GitHub releases, params repositories and Concourse pipelines
#[derive(Parser, Debug)]
#[command(name = "pipeline-helpers")]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Warnings and errors only
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Answer confirmations from --assume instead of the terminal
    #[arg(short = 'n', long, global = true)]
    pub non_interactive: bool,

    /// Answer for confirmations when non-interactive
    #[arg(long, global = true, value_enum, value_name = "ANSWER")]
    pub assume: Option<Assume>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Non-interactive answer.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assume {
    Yes,
    No,
}

/// Repository selection shared by every command.
#[derive(Args, Debug, Clone)]
pub struct RepoArgs {
    /// The repo to use
    #[arg(short, long)]
    pub repo: String,

    /// The GitHub owner [default: Utilities-tkgieng]
    #[arg(short, long)]
    pub owner: Option<String>,

    /// Base directory containing git repositories [default: $GIT_WORKSPACE or ~/git]
    #[arg(short, long, visible_alias = "git-dir", value_name = "DIR")]
    pub workspace: Option<PathBuf>,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the release pipeline, pin the release in params and set it on a foundation
    #[command(
        name = "create-release",
        after_help = "\
EXAMPLES:
    # Cut a release of ns-mgmt and roll it to cml-k8s-n-01
    pipeline-helpers create-release -f cml-k8s-n-01 -r ns-mgmt -m 'Release notes'

    # See what would happen
    pipeline-helpers create-release -f cml-k8s-n-01 -r ns-mgmt --dry-run"
    )]
    CreateRelease {
        /// The foundation to run the pipelines for
        #[arg(short, long)]
        foundation: String,

        #[command(flatten)]
        repo: RepoArgs,

        /// The release body
        #[arg(short, long, default_value = "")]
        message: String,

        /// The params repo name [default: params]
        #[arg(short, long)]
        params_repo: Option<String>,

        /// Log what would be done without changing anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Delete a GitHub release and, optionally, its git tag
    #[command(
        name = "delete-release",
        after_help = "\
EXAMPLES:
    pipeline-helpers delete-release -r ns-mgmt -t release-v1.2.3

    # Keep the git tag, do not prompt
    pipeline-helpers delete-release -r ns-mgmt -t release-v1.2.3 -x -n"
    )]
    DeleteRelease {
        #[command(flatten)]
        repo: RepoArgs,

        /// The release tag (e.g. release-v1.0.0)
        #[arg(short, long, visible_alias = "release-tag")]
        tag: String,

        /// Do not delete the git tag
        #[arg(short = 'x', long)]
        no_tag_deletion: bool,

        /// Log what would be done without changing anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Set a foundation back to a release already pinned in params
    #[command(name = "rollback-release")]
    RollbackRelease {
        /// The foundation to roll back
        #[arg(short, long)]
        foundation: String,

        #[command(flatten)]
        repo: RepoArgs,

        /// The release to roll back to (e.g. release-v1.2.3)
        #[arg(short = 't', long)]
        release: String,

        /// The params repo name [default: params]
        #[arg(short, long)]
        params_repo: Option<String>,

        /// Log what would be done without changing anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Pin a repository's latest release in the params repo
    #[command(name = "update-params-tag")]
    UpdateParamsTag {
        #[command(flatten)]
        repo: RepoArgs,

        /// The params repo name [default: params]
        #[arg(short, long)]
        params_repo: Option<String>,

        /// The params mainline branch [default: master]
        #[arg(short = 'd', long)]
        params_branch: Option<String>,

        /// Prefix of release tags in the repo
        #[arg(long, default_value = DEFAULT_TAG_PREFIX)]
        tag_prefix: String,

        /// Log what would be done without changing anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Replay a release end to end for a demo
    #[command(name = "demo-pipeline")]
    DemoPipeline {
        /// The foundation to run the pipelines for
        #[arg(short, long)]
        foundation: String,

        #[command(flatten)]
        repo: RepoArgs,

        /// The branch the pipelines track [default: current branch]
        #[arg(short, long)]
        branch: Option<String>,

        /// The params repo name [default: params]
        #[arg(short, long)]
        params_repo: Option<String>,

        /// The params branch [default: master]
        #[arg(short = 'd', long)]
        params_branch: Option<String>,

        /// The release tag to replay [default: latest release tag]
        #[arg(short, long)]
        tag: Option<String>,

        /// The release body
        #[arg(short, long, default_value = "")]
        message: String,

        /// Log what would be done without changing anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        after_help = "\
EXAMPLES:
    pipeline-helpers completion bash > ~/.local/share/bash-completion/completions/pipeline-helpers
    pipeline-helpers completion zsh > ~/.zfunc/_pipeline-helpers"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}
