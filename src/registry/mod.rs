//! registry
//!
//! Remote release registry (GitHub releases).
//!
//! # Architecture
//!
//! The [`ReleaseRegistry`] trait is the seam between the workflows and the
//! hosting service. Commands build a [`github::GitHubRegistry`]; tests use
//! [`mock::MockRegistry`]. Nothing substitutes the mock silently.
//!
//! # Modules
//!
//! - `traits`: `ReleaseRegistry`, `Release`, `RegistryError`
//! - [`github`]: GitHub REST implementation
//! - [`mock`]: In-memory test double

pub mod github;
pub mod mock;
mod traits;

pub use traits::*;
