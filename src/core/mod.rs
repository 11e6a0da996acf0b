//! core
//!
//! Domain types, naming conventions and configuration.
//!
//! # Modules
//!
//! - [`types`] - Strong types: ReleaseVersion, ReleaseTag, VersionDelta
//! - [`naming`] - Owner/path resolution and pipeline identifiers
//! - [`config`] - Configuration schema, loading and precedence
//! - [`paths`] - Per-user locations for config and logs
//!
//! # Design Principles
//!
//! - Strong typing keeps malformed versions out of the workflows
//! - Naming rules live in one place and are pure

pub mod config;
pub mod naming;
pub mod paths;
pub mod types;
