//! registry::traits
//!
//! Release registry trait definition.
//!
//! # Design
//!
//! The `ReleaseRegistry` trait is async because registry operations involve
//! network I/O. "Not found" is never an error on lookup: `find_release_by_tag`
//! returns `Ok(None)`, so callers can tell "nothing to delete" apart from
//! "couldn't reach the registry".
//!
//! # Example
//!
//! ```ignore
//! use pipeline_helpers::registry::{ReleaseRegistry, RegistryError};
//!
//! async fn drop_release(registry: &dyn ReleaseRegistry, tag: &str) -> Result<bool, RegistryError> {
//!     match registry.find_release_by_tag(tag).await? {
//!         Some(release) => {
//!             registry.delete_release(release.id).await?;
//!             Ok(true)
//!         }
//!         None => Ok(false),
//!     }
//! }
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from registry operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// No credential available.
    #[error("authentication required: set GITHUB_TOKEN")]
    AuthRequired,

    /// Invalid token or insufficient permissions.
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// A resource addressed by id does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Rate limit exceeded.
    #[error("rate limited")]
    RateLimited,

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// Network or connection error.
    #[error("network error: {0}")]
    NetworkError(String),
}

/// A published release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    /// Registry-internal id, used for deletion
    pub id: u64,
    /// Tag the release is attached to
    pub tag_name: String,
    /// Display name
    #[serde(default)]
    pub name: Option<String>,
    /// Release notes
    #[serde(default)]
    pub body: Option<String>,
}

impl Release {
    /// Name for listings, falling back to the tag.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.tag_name)
    }
}

/// Remote release registry for one repository.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`.
#[async_trait]
pub trait ReleaseRegistry: Send + Sync {
    /// Registry name, for logs.
    fn name(&self) -> &'static str;

    /// All releases of the repository, newest first.
    async fn list_releases(&self) -> Result<Vec<Release>, RegistryError>;

    /// The release attached to `tag`, or `None` when there is none.
    async fn find_release_by_tag(&self, tag: &str) -> Result<Option<Release>, RegistryError>;

    /// Delete a release by its internal id.
    async fn delete_release(&self, id: u64) -> Result<(), RegistryError>;
}
