//! cli
//!
//! Command-line interface layer.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Resolve repositories, credentials and collaborators from configuration
//! - Delegate to the [`crate::release`] workflows
//!
//! # Architecture
//!
//! The CLI layer is thin. Handlers build the gateways (git, registry,
//! control plane, prompter) and hand them to a workflow; no handler mutates
//! a repository itself.

pub mod args;
pub mod commands;

pub use args::{Assume, Cli, Shell};

use anyhow::Result;

use crate::core::config::Config;
use crate::ui::output::Verbosity;

/// What every handler needs from the invocation.
#[derive(Debug, Clone)]
pub struct Context {
    pub config: Config,
    pub verbosity: Verbosity,
    pub non_interactive: bool,
    pub assume: Option<Assume>,
}

impl Context {
    /// The non-interactive answer, or `None` when prompting the terminal.
    pub fn policy(&self, default: Assume) -> Option<Assume> {
        match (self.non_interactive, self.assume) {
            (false, _) => None,
            (true, Some(assume)) => Some(assume),
            (true, None) => Some(default),
        }
    }
}

/// Run a parsed invocation.
///
/// This is the entry point called from `main.rs` once configuration and
/// logging are in place.
pub fn run(cli: Cli, config: Config) -> Result<()> {
    let ctx = Context {
        config,
        verbosity: Verbosity::from_flags(cli.quiet, cli.debug),
        non_interactive: cli.non_interactive,
        assume: cli.assume,
    };
    commands::dispatch(cli.command, &ctx)
}
