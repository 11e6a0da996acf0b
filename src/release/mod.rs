//! release
//!
//! Release workflows composed from the gateways.
//!
//! # Modules
//!
//! - [`params`] - Locating and rewriting pinned release tags in params files
//! - [`reconciler`] - Propagate the latest release into the params repo
//! - [`pipelines`] - Release, set-release and refly pipeline sequences
//! - [`deletion`] - Delete a registry release and its git tag
//! - [`rollback`] - Point a foundation back at an older params tag
//! - [`reversion`] - Rewind the `version` branch for a demo run
//! - [`demo`] - The end-to-end demo pipeline
//! - [`create`] - Cut a release end to end
//!
//! # Outcomes
//!
//! Operator declines are not errors. Workflows that can be declined return
//! `Ok(false)` (or an outcome enum); errors are reserved for environment,
//! precondition and external-command failures.

pub mod create;
pub mod deletion;
pub mod demo;
pub mod params;
pub mod pipelines;
pub mod reconciler;
pub mod reversion;
pub mod rollback;

use std::path::PathBuf;

use thiserror::Error;

use crate::ci::PipelineError;
use crate::core::config::ConfigError;
use crate::core::types::TypeError;
use crate::git::GitError;
use crate::registry::RegistryError;
use crate::ui::prompts::PromptError;

pub use reconciler::{ReconcileError, ReconcileOptions, ReconcileOutcome, Reconciler};

/// Errors from release workflows.
#[derive(Debug, Error)]
pub enum ReleaseError {
    /// The repository has local modifications.
    #[error("{path} has uncommitted changes; commit or stash them first")]
    DirtyRepo { path: PathBuf },

    /// No release tags to work from.
    #[error("no release tags found in {path}; make sure to fly the release pipeline")]
    NoReleaseTags { path: PathBuf },

    /// The requested release is not tagged on the params repo.
    #[error("release {release} must be a valid release tagged on the params repo")]
    UnknownParamsRelease {
        release: String,
        /// Releases that are tagged, e.g. `release-v1.2.3`
        valid: Vec<String>,
    },

    /// The params update did not complete.
    #[error("failed to update the params git release tag")]
    ParamsNotUpdated,

    /// Reading or writing a file in a working copy.
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    #[error(transparent)]
    VersionControl(#[from] GitError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Prompt(#[from] PromptError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    InvalidRelease(#[from] TypeError),
}
