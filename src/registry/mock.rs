//! registry::mock
//!
//! In-memory release registry for tests.
//!
//! # Design
//!
//! Stores releases in memory, records every call and can be told to fail a
//! specific operation. It is a test double: production code paths always
//! construct a [`GitHubRegistry`](super::github::GitHubRegistry).
//!
//! # Example
//!
//! ```
//! use pipeline_helpers::registry::mock::MockRegistry;
//! use pipeline_helpers::registry::ReleaseRegistry;
//!
//! # tokio_test::block_on(async {
//! let registry = MockRegistry::new().with_release(7, "release-v1.0.0", "v1.0.0");
//!
//! let found = registry.find_release_by_tag("release-v1.0.0").await.unwrap();
//! assert_eq!(found.map(|r| r.id), Some(7));
//!
//! registry.delete_release(7).await.unwrap();
//! assert!(registry.find_release_by_tag("release-v1.0.0").await.unwrap().is_none());
//! # });
//! ```

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use super::traits::{Release, RegistryError, ReleaseRegistry};

/// Mock registry for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockRegistry {
    inner: Arc<Mutex<MockRegistryInner>>,
}

#[derive(Debug, Default)]
struct MockRegistryInner {
    releases: Vec<Release>,
    fail_on: Option<FailOn>,
    operations: Vec<MockOperation>,
}

/// Which operation should fail.
#[derive(Debug, Clone)]
pub enum FailOn {
    ListReleases(RegistryError),
    FindReleaseByTag(RegistryError),
    DeleteRelease(RegistryError),
}

/// Recorded operation for test verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOperation {
    ListReleases,
    FindReleaseByTag { tag: String },
    DeleteRelease { id: u64 },
}

impl MockRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a release.
    pub fn with_release(self, id: u64, tag: &str, name: &str) -> Self {
        self.state().releases.push(Release {
            id,
            tag_name: tag.to_string(),
            name: Some(name.to_string()),
            body: None,
        });
        self
    }

    /// Configure the mock to fail on a specific operation.
    pub fn fail_on(self, fail_on: FailOn) -> Self {
        self.state().fail_on = Some(fail_on);
        self
    }

    /// Recorded operations, in call order.
    pub fn operations(&self) -> Vec<MockOperation> {
        self.state().operations.clone()
    }

    /// Releases currently stored.
    pub fn releases(&self) -> Vec<Release> {
        self.state().releases.clone()
    }

    // A panicking test must not poison every later assertion.
    fn state(&self) -> MutexGuard<'_, MockRegistryInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl ReleaseRegistry for MockRegistry {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn list_releases(&self) -> Result<Vec<Release>, RegistryError> {
        let mut inner = self.state();
        inner.operations.push(MockOperation::ListReleases);
        if let Some(FailOn::ListReleases(e)) = &inner.fail_on {
            return Err(e.clone());
        }
        Ok(inner.releases.iter().rev().cloned().collect())
    }

    async fn find_release_by_tag(&self, tag: &str) -> Result<Option<Release>, RegistryError> {
        let mut inner = self.state();
        inner.operations.push(MockOperation::FindReleaseByTag {
            tag: tag.to_string(),
        });
        if let Some(FailOn::FindReleaseByTag(e)) = &inner.fail_on {
            return Err(e.clone());
        }
        Ok(inner.releases.iter().find(|r| r.tag_name == tag).cloned())
    }

    async fn delete_release(&self, id: u64) -> Result<(), RegistryError> {
        let mut inner = self.state();
        inner.operations.push(MockOperation::DeleteRelease { id });
        if let Some(FailOn::DeleteRelease(e)) = &inner.fail_on {
            return Err(e.clone());
        }
        let before = inner.releases.len();
        inner.releases.retain(|r| r.id != id);
        if inner.releases.len() == before {
            return Err(RegistryError::NotFound(format!("release {}", id)));
        }
        Ok(())
    }
}
