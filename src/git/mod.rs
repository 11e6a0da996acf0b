//! git
//!
//! Single interface for all working-copy operations.
//!
//! # Architecture
//!
//! This module is the only doorway to Git. No other module imports `git2`
//! or spawns the `git` executable.
//!
//! # Responsibilities
//!
//! - Opening a working copy at its root
//! - Tag listing, existence, create/delete (local and origin)
//! - Branch create/checkout/delete, rebase and merge
//! - Pull (upstream or all remotes), push, commit
//! - Dirty checks, status and diff rendering
//! - Remote URL parsing
//!
//! # Invariants
//!
//! - Every operation either succeeds or returns a typed [`GitError`]
//! - Nothing retries automatically

mod interface;

pub use interface::{Git, GitError, WorktreeStatus};
