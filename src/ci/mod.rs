//! ci
//!
//! Concourse control plane.
//!
//! # Modules
//!
//! - `traits`: `Pipelines` and `PipelineError`
//! - [`fly`]: Implementation over the `fly` CLI and per-repo scripts
//! - [`mock`]: Recording test double

pub mod fly;
pub mod mock;
mod traits;

pub use traits::*;
