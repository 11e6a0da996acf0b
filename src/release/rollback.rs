//! release::rollback
//!
//! Point a foundation back at a release already tagged on the params repo.

use tracing::{error, info};

use super::pipelines::PipelineRunner;
use super::ReleaseError;
use crate::core::types::validate_release_param;
use crate::git::Git;

/// Options for [`rollback_release`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollbackOptions {
    /// Release to go back to, e.g. `release-v1.2.3`.
    pub release: String,
    pub tag_prefix: String,
}

/// Releases of `repo` tagged on the params repo (`<repo>-` stripped).
pub fn params_releases(tags: &[String], repo: &str) -> Vec<String> {
    let prefix = format!("{}-", repo);
    tags.iter()
        .filter_map(|t| t.strip_prefix(&prefix))
        .map(str::to_string)
        .collect()
}

/// Validate that `<repo>-<release>` is tagged on params.
///
/// On failure the valid releases are logged and carried by the error.
pub fn validate_params_release(
    params: &Git,
    repo: &str,
    options: &RollbackOptions,
    refresh: bool,
) -> Result<String, ReleaseError> {
    validate_release_param(&options.release, &options.tag_prefix)?;

    if refresh {
        params.pull_all()?;
    }
    let tags = params.list_tags()?;
    let tag = format!("{}-{}", repo, options.release);
    if tags.contains(&tag) {
        return Ok(tag);
    }

    let valid = params_releases(&tags, repo);
    error!(
        "Release [-r {}] must be a valid release tagged on the params repo",
        options.release
    );
    info!("Valid tags are:");
    for release in &valid {
        info!("> {}", release);
    }
    Err(ReleaseError::UnknownParamsRelease {
        release: options.release.clone(),
        valid,
    })
}

/// Roll back: validate the release, run the set-release pipeline and offer
/// `prepare-kustomizations`.
///
/// Returns `Ok(false)` when the operator declined the set-release step.
pub fn rollback_release(
    runner: &PipelineRunner<'_>,
    repo_git: &Git,
    params: &Git,
    repo: &str,
    options: &RollbackOptions,
) -> Result<bool, ReleaseError> {
    let tag = validate_params_release(params, repo, options, !runner.is_dry_run())?;
    info!("Rolling {} back to {}", runner.names().management, tag);

    let branch = current_branch_or_head(repo_git)?;
    let params_branch = current_branch_or_head(params)?;
    if !runner.run_set_release_pipeline(&branch, &params_branch)? {
        return Ok(false);
    }
    runner.run_prepare_kustomizations(false)?;
    Ok(true)
}

/// Current branch name, or `HEAD` when detached.
pub(crate) fn current_branch_or_head(git: &Git) -> Result<String, ReleaseError> {
    Ok(git.current_branch()?.unwrap_or_else(|| "HEAD".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_releases_are_scoped_to_repo() {
        let tags = vec![
            "ns-mgmt-release-v1.0.0".to_string(),
            "ns-mgmt-release-v1.1.0".to_string(),
            "other-release-v2.0.0".to_string(),
        ];
        assert_eq!(
            params_releases(&tags, "ns-mgmt"),
            vec!["release-v1.0.0", "release-v1.1.0"]
        );
    }
}
