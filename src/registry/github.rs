//! registry::github
//!
//! GitHub releases via the REST API.
//!
//! # Design
//!
//! - `GET /repos/{owner}/{repo}/releases` (paginated, 100 per page)
//! - `GET /repos/{owner}/{repo}/releases/tags/{tag}` (404 means "no release")
//! - `DELETE /repos/{owner}/{repo}/releases/{id}`
//!
//! The API base is configurable for GitHub Enterprise and tests.
//!
//! # Rate Limiting
//!
//! Returns `RegistryError::RateLimited` when limits are hit. No automatic
//! retry.
//!
//! # Example
//!
//! ```ignore
//! use pipeline_helpers::registry::github::GitHubRegistry;
//! use pipeline_helpers::registry::ReleaseRegistry;
//!
//! let registry = GitHubRegistry::new(token, "Utilities-tkgieng", "ns-mgmt");
//! if let Some(release) = registry.find_release_by_tag("release-v1.2.0").await? {
//!     registry.delete_release(release.id).await?;
//! }
//! ```

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use tracing::debug;

use super::traits::{Release, RegistryError, ReleaseRegistry};
use crate::core::config::DEFAULT_GITHUB_API_URL;

/// User-Agent header value for API requests.
const USER_AGENT_VALUE: &str = "pipeline-helpers";

/// Page size for release listings.
const PER_PAGE: usize = 100;

/// GitHub release registry for one repository.
pub struct GitHubRegistry {
    client: Client,
    token: String,
    owner: String,
    repo: String,
    api_base: String,
}

// Custom Debug to avoid exposing the token
impl std::fmt::Debug for GitHubRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubRegistry")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("api_base", &self.api_base)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct GitHubErrorResponse {
    message: String,
}

impl GitHubRegistry {
    /// Registry against api.github.com.
    pub fn new(token: impl Into<String>, owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self::with_api_base(token, owner, repo, DEFAULT_GITHUB_API_URL)
    }

    /// Registry against a custom API base (e.g. `https://github.example.com/api/v3`).
    pub fn with_api_base(
        token: impl Into<String>,
        owner: impl Into<String>,
        repo: impl Into<String>,
        api_base: impl Into<String>,
    ) -> Self {
        let api_base: String = api_base.into();
        Self {
            client: Client::new(),
            token: token.into(),
            owner: owner.into(),
            repo: repo.into(),
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    /// Get the repository owner.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Get the repository name.
    pub fn repo(&self) -> &str {
        &self.repo
    }

    fn headers(&self) -> Result<HeaderMap, RegistryError> {
        if self.token.is_empty() {
            return Err(RegistryError::AuthRequired);
        }
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.token))
                .map_err(|_| RegistryError::AuthFailed("token is not a valid header value".into()))?,
        );
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        Ok(headers)
    }

    /// Build URL for a repository endpoint.
    fn repo_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.api_base, self.owner, self.repo, path
        )
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Response, RegistryError> {
        request
            .headers(self.headers()?)
            .send()
            .await
            .map_err(|e| RegistryError::NetworkError(e.to_string()))
    }

    async fn handle_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: Response,
    ) -> Result<T, RegistryError> {
        let status = response.status();

        if status.is_success() {
            response.json().await.map_err(|e| RegistryError::ApiError {
                status: status.as_u16(),
                message: format!("Failed to parse response: {}", e),
            })
        } else {
            Err(Self::error_from_response(response, status).await)
        }
    }

    async fn error_from_response(response: Response, status: StatusCode) -> RegistryError {
        let message = match response.json::<GitHubErrorResponse>().await {
            Ok(err) => err.message,
            Err(_) => "Unknown error".to_string(),
        };

        match status {
            StatusCode::UNAUTHORIZED => RegistryError::AuthFailed("Invalid or expired token".into()),
            StatusCode::FORBIDDEN if message.to_lowercase().contains("rate limit") => {
                RegistryError::RateLimited
            }
            StatusCode::FORBIDDEN => {
                RegistryError::AuthFailed(format!("Permission denied: {}", message))
            }
            StatusCode::NOT_FOUND => RegistryError::NotFound(message),
            StatusCode::TOO_MANY_REQUESTS => RegistryError::RateLimited,
            _ if status.is_server_error() => RegistryError::ApiError {
                status: status.as_u16(),
                message: format!("GitHub server error: {}", message),
            },
            _ => RegistryError::ApiError {
                status: status.as_u16(),
                message,
            },
        }
    }
}

#[async_trait]
impl ReleaseRegistry for GitHubRegistry {
    fn name(&self) -> &'static str {
        "github"
    }

    async fn list_releases(&self) -> Result<Vec<Release>, RegistryError> {
        let mut releases = Vec::new();
        let mut page = 1;

        loop {
            let url = self.repo_url(&format!("releases?per_page={}&page={}", PER_PAGE, page));
            debug!(%url, "listing releases");
            let response = self.send(self.client.get(&url)).await?;
            let batch: Vec<Release> = self.handle_response(response).await?;
            let done = batch.len() < PER_PAGE;
            releases.extend(batch);
            if done {
                break;
            }
            page += 1;
        }

        Ok(releases)
    }

    async fn find_release_by_tag(&self, tag: &str) -> Result<Option<Release>, RegistryError> {
        let url = self.repo_url(&format!("releases/tags/{}", tag));
        debug!(%url, "looking up release");
        let response = self.send(self.client.get(&url)).await?;

        match self.handle_response(response).await {
            Ok(release) => Ok(Some(release)),
            Err(RegistryError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn delete_release(&self, id: u64) -> Result<(), RegistryError> {
        let url = self.repo_url(&format!("releases/{}", id));
        debug!(%url, "deleting release");
        let response = self.send(self.client.delete(&url)).await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Self::error_from_response(response, status).await)
        }
    }
}
