//! release::reversion
//!
//! Rewind a repository's `version` branch before a demo release.
//!
//! The release pipeline bumps the `version` file on the `version` branch
//! and cuts from the `release` branch. Reverting writes an older version,
//! pushes it, and recreates `release` from the mainline with `version`
//! merged in, so the next pipeline run produces that release again.
//!
//! Whatever happens, the working copy is returned to the operator's branch
//! (`develop` when they started on `version`) and pulled.

use std::fs;

use tracing::{error, info, warn};

use super::ReleaseError;
use crate::core::types::{sorted_release_tags, ReleaseVersion};
use crate::git::Git;
use crate::ui::prompts::Prompter;

/// Branch holding the `version` file.
pub const VERSION_BRANCH: &str = "version";
/// File holding the current version on [`VERSION_BRANCH`].
pub const VERSION_FILE: &str = "version";
/// Branch the release pipeline cuts from.
pub const RELEASE_BRANCH: &str = "release";
/// Where to go back to when the operator started on [`VERSION_BRANCH`].
pub const FALLBACK_BRANCH: &str = "develop";

/// Version-branch reversion for one working copy.
pub struct VersionReversion<'a> {
    git: &'a Git,
    prompter: &'a dyn Prompter,
    mainline: String,
    tag_prefix: String,
    dry_run: bool,
}

impl<'a> VersionReversion<'a> {
    pub fn new(git: &'a Git, prompter: &'a dyn Prompter, mainline: &str, tag_prefix: &str) -> Self {
        Self {
            git,
            prompter,
            mainline: mainline.to_string(),
            tag_prefix: tag_prefix.to_string(),
            dry_run: false,
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Show the current version and offer to revert it.
    ///
    /// Returns the version reverted to, if any.
    pub fn handle(&self, branch: &str) -> Result<Option<ReleaseVersion>, ReleaseError> {
        if self.dry_run {
            info!("[DRY RUN] Would check out and pull the {} branch", VERSION_BRANCH);
            info!("[DRY RUN] Would read the {} file and offer to revert it", VERSION_FILE);
            return Ok(None);
        }

        self.git.checkout(VERSION_BRANCH)?;
        self.git.pull_branch("origin", VERSION_BRANCH)?;

        let reverted = self.offer_reversion();
        let returned = self.return_to(branch);
        let reverted = reverted?;
        returned?;
        Ok(reverted)
    }

    fn offer_reversion(&self) -> Result<Option<ReleaseVersion>, ReleaseError> {
        let path = self.git.workdir().join(VERSION_FILE);
        if !path.is_file() {
            error!("Version file not found at {}", path.display());
            return Ok(None);
        }
        let current = fs::read_to_string(&path).map_err(|source| ReleaseError::Io {
            path: path.clone(),
            source,
        })?;
        info!("The current version is: {}", current.trim());

        if !self
            .prompter
            .confirm("Do you want to revert to an older version?")?
        {
            return Ok(None);
        }

        match self.ask_version()? {
            Some(version) => {
                self.revert(&version)?;
                Ok(Some(version))
            }
            None => {
                info!("Version reversion cancelled");
                Ok(None)
            }
        }
    }

    /// Ask until the operator gives a released `X.Y.Z` or gives up.
    pub fn ask_version(&self) -> Result<Option<ReleaseVersion>, ReleaseError> {
        loop {
            let answer = self
                .prompter
                .input("Enter the version you want to revert to:")?;

            match answer.trim().parse::<ReleaseVersion>() {
                Err(_) => {
                    error!("Invalid version format: {}", answer.trim());
                    info!("Version must be in semantic version format (e.g., 1.2.3)");
                }
                Ok(version) => {
                    let tag = format!("{}{}", self.tag_prefix, version);
                    if self.git.tag_exists(&tag) {
                        return Ok(Some(version));
                    }
                    error!("No git tag found for version: {}", tag);
                    info!("Available release tags:");
                    for tag in sorted_release_tags(self.git.list_tags()?, &self.tag_prefix) {
                        info!("{}", tag);
                    }
                }
            }

            if !self.prompter.confirm("Would you like to try again?")? {
                return Ok(None);
            }
        }
    }

    /// Write `version`, push it, and recreate the release branch.
    pub fn revert(&self, version: &ReleaseVersion) -> Result<(), ReleaseError> {
        info!("Reverting to version: {}", version);
        let git = self.git;

        git.checkout(VERSION_BRANCH)?;
        git.pull_branch("origin", VERSION_BRANCH)?;
        let path = git.workdir().join(VERSION_FILE);
        fs::write(&path, version.to_string())
            .map_err(|source| ReleaseError::Io { path, source })?;
        git.add_all()?;
        git.commit(&format!("Revert version back to {} NOTICKET", version))?;
        git.push("origin", VERSION_BRANCH)?;

        git.checkout(&self.mainline)?;
        git.pull_branch("origin", VERSION_BRANCH)?;
        if git.branch_exists(RELEASE_BRANCH) {
            git.delete_branch(RELEASE_BRANCH)?;
        }
        if let Err(e) = git.delete_remote_branch("origin", RELEASE_BRANCH) {
            warn!("Could not delete origin/{}: {}", RELEASE_BRANCH, e);
        }
        git.create_branch(RELEASE_BRANCH, None)?;
        git.push_set_upstream("origin", RELEASE_BRANCH)?;
        Ok(())
    }

    fn return_to(&self, branch: &str) -> Result<(), ReleaseError> {
        let branch = return_branch(branch);
        self.git.checkout(branch)?;
        self.git.pull()?;
        Ok(())
    }
}

/// The branch to return to after working on the version branch.
pub fn return_branch(branch: &str) -> &str {
    if branch == VERSION_BRANCH {
        FALLBACK_BRANCH
    } else {
        branch
    }
}
