//! core::naming
//!
//! Repository, params and pipeline naming conventions.
//!
//! Every entry point resolves repositories through [`resolve_repo`], so the
//! owner-suffix rule lives in exactly one place.
//!
//! # Owner suffix rule
//!
//! - A trailing `-<owner>` on the supplied name is stripped to get the base
//!   name. This applies to every owner, the default one included.
//! - The canonical (on-disk) name is the base name for the default owner
//!   and `<base>-<owner>` for any other owner.
//! - The working copy lives at `<workspace>/<canonical>`.
//!
//! # Example
//!
//! ```
//! use pipeline_helpers::core::naming::{resolve_repo, DEFAULT_OWNER};
//! use std::path::Path;
//!
//! let r = resolve_repo("ns-mgmt-acme", "acme", Path::new("/git"));
//! assert_eq!(r.name, "ns-mgmt");
//! assert_eq!(r.canonical_name, "ns-mgmt-acme");
//!
//! let r = resolve_repo("ns-mgmt", DEFAULT_OWNER, Path::new("/git"));
//! assert_eq!(r.path, Path::new("/git/ns-mgmt"));
//! ```

use std::path::{Path, PathBuf};

use crate::core::config::ConfigError;
use crate::core::types::ReleaseVersion;

/// Organization that owns the fleet's repositories by default.
pub const DEFAULT_OWNER: &str = "Utilities-tkgieng";

/// Job that cuts the final release.
pub const CREATE_FINAL_RELEASE_JOB: &str = "create-final-release";

/// Job that sets the release pipeline on a foundation.
pub const SET_RELEASE_PIPELINE_JOB: &str = "set-release-pipeline";

/// Job that regenerates kustomizations in the management pipeline.
pub const PREPARE_KUSTOMIZATIONS_JOB: &str = "prepare-kustomizations";

/// A resolved repository reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    /// Base name, without any owner suffix.
    pub name: String,
    /// Owning organization.
    pub owner: String,
    /// Name of the working copy directory (and of the remote repository).
    pub canonical_name: String,
    /// Local working copy path.
    pub path: PathBuf,
}

impl RepoRef {
    /// Whether this repository belongs to the default owner.
    pub fn is_default_owner(&self) -> bool {
        self.owner == DEFAULT_OWNER
    }

    /// Fail unless the working copy directory exists.
    pub fn ensure_exists(&self) -> Result<(), ConfigError> {
        if self.path.is_dir() {
            Ok(())
        } else {
            Err(ConfigError::MissingWorkingCopy {
                name: self.canonical_name.clone(),
                path: self.path.clone(),
            })
        }
    }

    /// The repository's CI directory.
    pub fn ci_dir(&self) -> PathBuf {
        self.path.join("ci")
    }
}

/// Resolve a repository name and owner to its canonical name and path.
pub fn resolve_repo(name: &str, owner: &str, workspace: &Path) -> RepoRef {
    let base = strip_owner_suffix(name, owner);
    let canonical_name = if owner == DEFAULT_OWNER {
        base.to_string()
    } else {
        format!("{}-{}", base, owner)
    };

    RepoRef {
        name: base.to_string(),
        owner: owner.to_string(),
        path: workspace.join(&canonical_name),
        canonical_name,
    }
}

fn strip_owner_suffix<'a>(name: &'a str, owner: &str) -> &'a str {
    if owner.is_empty() {
        return name;
    }
    match name.strip_suffix(owner).and_then(|n| n.strip_suffix('-')) {
        Some(base) if !base.is_empty() => base,
        _ => name,
    }
}

/// `<repo>-release-v<version>`, used for both the params branch and tag.
pub fn params_tag_name(repo: &str, version: &ReleaseVersion) -> String {
    format!("{}-release-{}", repo, version.as_ref_string())
}

/// Branch carrying a params update; same shape as the params tag.
pub fn params_branch_name(repo: &str, version: &ReleaseVersion) -> String {
    params_tag_name(repo, version)
}

/// Pipeline names for one repository on one foundation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineNames {
    /// `tkgi-<repo>[-<owner>]-release`
    pub release: String,
    /// `tkgi-<repo>[-<owner>]-<foundation>`
    pub management: String,
    /// `<management>-set-release-pipeline`
    pub set_release: String,
}

impl PipelineNames {
    pub fn new(repo_base: &str, owner: &str, foundation: &str) -> Self {
        let stem = if owner == DEFAULT_OWNER {
            format!("tkgi-{}", repo_base)
        } else {
            format!("tkgi-{}-{}", repo_base, owner)
        };
        let management = format!("{}-{}", stem, foundation);

        Self {
            release: format!("{}-release", stem),
            set_release: format!("{}-set-release-pipeline", management),
            management,
        }
    }

    /// `pipeline/job` path for the create-final-release job.
    pub fn create_final_release_job(&self) -> String {
        job_path(&self.release, CREATE_FINAL_RELEASE_JOB)
    }

    /// `pipeline/job` path for the set-release-pipeline job.
    pub fn set_release_job(&self) -> String {
        job_path(&self.set_release, SET_RELEASE_PIPELINE_JOB)
    }

    /// `pipeline/job` path for the prepare-kustomizations job.
    pub fn prepare_kustomizations_job(&self) -> String {
        job_path(&self.management, PREPARE_KUSTOMIZATIONS_JOB)
    }
}

/// Join a pipeline and job name the way `fly -j` expects.
pub fn job_path(pipeline: &str, job: &str) -> String {
    format!("{}/{}", pipeline, job)
}
