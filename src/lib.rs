//! pipeline-helpers - Release management for Concourse-deployed repositories
//!
//! Cuts GitHub releases through a repository's Concourse release pipeline,
//! pins the released version in a shared params repository and sets that
//! release on a foundation. Also deletes releases, rolls foundations back
//! and replays a release end to end for demos.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface layer (parses args, builds gateways)
//! - [`release`] - The release workflows, written against the gateways
//! - [`core`] - Domain types, naming rules and configuration
//! - [`git`] - Single interface for all Git operations
//! - [`registry`] - GitHub releases behind the `ReleaseRegistry` trait
//! - [`ci`] - Concourse `fly` behind the `Pipelines` trait
//! - [`ui`] - Prompts and console output
//! - [`logging`] - Console and file tracing setup
//!
//! # Invariants
//!
//! 1. Every mutating step is confirmed by the operator or a fixed policy
//! 2. A dry run touches no repository, release or pipeline
//! 3. A failed params update leaves the params mainline as it was

pub mod ci;
pub mod cli;
pub mod core;
pub mod git;
pub mod logging;
pub mod registry;
pub mod release;
pub mod ui;
