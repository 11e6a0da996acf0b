//! git::interface
//!
//! Working-copy gateway: git2 for reads, the `git` executable for
//! mutations and network operations.
//!
//! # Architecture
//!
//! The `Git` struct is the only way the workflows touch a repository.
//! Reads (tags, status, current branch, remotes) go through `git2` so they
//! are fast and structured. Anything that changes refs, the index or a
//! remote runs the `git` executable in the working copy, so credentials,
//! hooks and user configuration behave exactly as they do for the operator.
//!
//! # Error Handling
//!
//! - [`GitError::NotARepo`]: path is not the root of a working copy
//! - [`GitError::BareRepo`]: repository has no working directory
//! - [`GitError::CommandFailed`]: `git` exited non-zero; carries the command,
//!   exit code and stderr
//! - [`GitError::Spawn`]: the `git` executable could not be started
//!
//! Nothing here retries. Transient network failures surface to the caller.
//!
//! # Example
//!
//! ```ignore
//! use pipeline_helpers::git::Git;
//! use std::path::Path;
//!
//! let git = Git::open(Path::new("/home/me/git/params"))?;
//! git.pull_all()?;
//! if git.has_uncommitted_changes()? {
//!     println!("params has local edits");
//! }
//! ```

use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;
use tracing::{debug, warn};

/// Errors from Git operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// Not inside a Git repository.
    #[error("not a git repository: {path}")]
    NotARepo {
        /// The path that was searched
        path: PathBuf,
    },

    /// Repository is bare (no working directory).
    #[error("bare repository not supported")]
    BareRepo,

    /// The git executable exited non-zero.
    #[error("'{command}' failed with exit code {code}: {stderr}")]
    CommandFailed {
        /// The command line that failed
        command: String,
        /// Exit code (-1 when killed by a signal)
        code: i32,
        /// Trimmed standard error
        stderr: String,
    },

    /// The git executable could not be started.
    #[error("failed to run '{command}': {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    /// Internal git2 error.
    #[error("git error: {message}")]
    Internal {
        /// The error message
        message: String,
    },
}

impl From<git2::Error> for GitError {
    fn from(err: git2::Error) -> Self {
        GitError::Internal {
            message: err.message().to_string(),
        }
    }
}

/// Summary of working tree status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorktreeStatus {
    /// Number of staged changes
    pub staged: usize,
    /// Number of unstaged changes to tracked files
    pub unstaged: usize,
    /// Number of untracked files (if requested)
    pub untracked: usize,
    /// Whether there are unresolved conflicts
    pub has_conflicts: bool,
}

impl WorktreeStatus {
    /// No staged, unstaged or conflicted entries. Untracked files don't count.
    pub fn is_clean(&self) -> bool {
        self.staged == 0 && self.unstaged == 0 && !self.has_conflicts
    }
}

/// A working copy.
pub struct Git {
    repo: git2::Repository,
    workdir: PathBuf,
}

impl std::fmt::Debug for Git {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Git").field("workdir", &self.workdir).finish()
    }
}

impl Git {
    // =========================================================================
    // Repository Opening
    // =========================================================================

    /// Open the working copy rooted at `path`.
    ///
    /// Parent directories are not searched: a plain directory inside some
    /// other repository is not a working copy.
    ///
    /// # Errors
    ///
    /// - [`GitError::NotARepo`] if `path` is not a repository root
    /// - [`GitError::BareRepo`] if the repository has no working directory
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let repo = git2::Repository::open(path).map_err(|_| GitError::NotARepo {
            path: path.to_path_buf(),
        })?;

        let workdir = repo.workdir().ok_or(GitError::BareRepo)?.to_path_buf();

        Ok(Self { repo, workdir })
    }

    /// Root of the working copy.
    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// All tag names, in no particular order.
    pub fn list_tags(&self) -> Result<Vec<String>, GitError> {
        let names = self.repo.tag_names(None)?;
        Ok(names.iter().flatten().map(String::from).collect())
    }

    /// Whether `refs/tags/<name>` exists locally.
    pub fn tag_exists(&self, name: &str) -> bool {
        self.repo
            .find_reference(&format!("refs/tags/{}", name))
            .is_ok()
    }

    /// Count working tree changes.
    pub fn worktree_status(&self, include_untracked: bool) -> Result<WorktreeStatus, GitError> {
        let mut opts = git2::StatusOptions::new();
        opts.include_untracked(include_untracked)
            .include_ignored(false);

        let statuses = self.repo.statuses(Some(&mut opts))?;
        let mut result = WorktreeStatus::default();

        for entry in statuses.iter() {
            let status = entry.status();

            if status.is_conflicted() {
                result.has_conflicts = true;
            }

            if status.is_index_new()
                || status.is_index_modified()
                || status.is_index_deleted()
                || status.is_index_renamed()
                || status.is_index_typechange()
            {
                result.staged += 1;
            }

            if status.is_wt_modified()
                || status.is_wt_deleted()
                || status.is_wt_renamed()
                || status.is_wt_typechange()
            {
                result.unstaged += 1;
            }

            if status.is_wt_new() {
                result.untracked += 1;
            }
        }

        Ok(result)
    }

    /// Staged or unstaged changes to tracked files.
    pub fn has_uncommitted_changes(&self) -> Result<bool, GitError> {
        Ok(!self.worktree_status(false)?.is_clean())
    }

    /// Untracked files, relative to the working copy root.
    pub fn untracked_files(&self) -> Result<Vec<PathBuf>, GitError> {
        let mut opts = git2::StatusOptions::new();
        opts.include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(false);

        let statuses = self.repo.statuses(Some(&mut opts))?;
        Ok(statuses
            .iter()
            .filter(|entry| entry.status().is_wt_new())
            .filter_map(|entry| entry.path().map(PathBuf::from))
            .collect())
    }

    /// The current branch name, or `None` when detached or unborn.
    pub fn current_branch(&self) -> Result<Option<String>, GitError> {
        let head = match self.repo.head() {
            Ok(h) => h,
            Err(e) if e.code() == git2::ErrorCode::UnbornBranch => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if head.is_branch() {
            return Ok(head.shorthand().map(String::from));
        }

        Ok(None)
    }

    /// Whether a local branch exists.
    pub fn branch_exists(&self, name: &str) -> bool {
        self.repo.find_branch(name, git2::BranchType::Local).is_ok()
    }

    /// Names of all configured remotes.
    pub fn remotes(&self) -> Result<Vec<String>, GitError> {
        let remotes = self.repo.remotes()?;
        Ok(remotes.iter().flatten().map(String::from).collect())
    }

    /// Get the URL for a remote, `None` if the remote doesn't exist.
    pub fn remote_url(&self, name: &str) -> Result<Option<String>, GitError> {
        match self.repo.find_remote(name) {
            Ok(remote) => Ok(remote.url().map(String::from)),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Parse a remote URL into owner/repo for GitHub.
    ///
    /// ```
    /// use pipeline_helpers::git::Git;
    ///
    /// assert_eq!(
    ///     Git::parse_github_remote("git@github.com:Utilities-tkgieng/ns-mgmt.git"),
    ///     Some(("Utilities-tkgieng".to_string(), "ns-mgmt".to_string()))
    /// );
    /// assert_eq!(Git::parse_github_remote("https://gitlab.com/o/r.git"), None);
    /// ```
    pub fn parse_github_remote(url: &str) -> Option<(String, String)> {
        let rest = url
            .strip_prefix("https://github.com/")
            .or_else(|| url.strip_prefix("git@github.com:"))
            .or_else(|| url.strip_prefix("ssh://git@github.com/"))?;

        let rest = rest.strip_suffix(".git").unwrap_or(rest);
        let (owner, repo) = rest.split_once('/')?;
        if owner.is_empty() || repo.is_empty() || repo.contains('/') {
            return None;
        }

        Some((owner.to_string(), repo.to_string()))
    }

    // =========================================================================
    // Mutations (git executable)
    // =========================================================================

    /// Run `git <args>` in the working copy and return its stdout.
    pub fn run(&self, args: &[&str]) -> Result<String, GitError> {
        let command = format!("git {}", args.join(" "));
        debug!(cwd = %self.workdir.display(), "{}", command);

        let output = Command::new("git")
            .args(args)
            .current_dir(&self.workdir)
            .output()
            .map_err(|source| GitError::Spawn {
                command: command.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(GitError::CommandFailed {
                command,
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// `git pull -q` from the current branch's upstream.
    pub fn pull(&self) -> Result<(), GitError> {
        self.run(&["pull", "-q"]).map(drop)
    }

    /// `git pull -q <remote> <branch>`
    pub fn pull_branch(&self, remote: &str, branch: &str) -> Result<(), GitError> {
        self.run(&["pull", "-q", remote, branch]).map(drop)
    }

    /// Fetch every remote (tags included) and merge the upstream.
    pub fn pull_all(&self) -> Result<(), GitError> {
        self.run(&["pull", "-q", "--all", "--tags"]).map(drop)
    }

    /// `git checkout <branch>`
    pub fn checkout(&self, branch: &str) -> Result<(), GitError> {
        self.run(&["checkout", "-q", branch]).map(drop)
    }

    /// `git checkout -b <branch> [<start>]`
    pub fn create_branch(&self, branch: &str, start: Option<&str>) -> Result<(), GitError> {
        let mut args = vec!["checkout", "-q", "-b", branch];
        args.extend(start);
        self.run(&args).map(drop)
    }

    /// `git branch -D <branch>`
    pub fn delete_branch(&self, branch: &str) -> Result<(), GitError> {
        self.run(&["branch", "-D", branch]).map(drop)
    }

    /// `git rebase <upstream>`
    pub fn rebase(&self, upstream: &str) -> Result<(), GitError> {
        self.run(&["rebase", upstream]).map(drop)
    }

    /// `git merge --no-edit <branch>`
    pub fn merge(&self, branch: &str) -> Result<(), GitError> {
        self.run(&["merge", "--no-edit", branch]).map(drop)
    }

    /// `git add -A`
    pub fn add_all(&self) -> Result<(), GitError> {
        self.run(&["add", "-A"]).map(drop)
    }

    /// `git add -- <paths>`
    pub fn add_paths(&self, paths: &[&Path]) -> Result<(), GitError> {
        let mut args = vec!["add".to_string(), "--".to_string()];
        args.extend(paths.iter().map(|p| p.to_string_lossy().into_owned()));
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        self.run(&args).map(drop)
    }

    /// `git commit -m <message>`
    pub fn commit(&self, message: &str) -> Result<(), GitError> {
        self.run(&["commit", "-q", "-m", message]).map(drop)
    }

    /// `git push <remote> <refspec>`
    pub fn push(&self, remote: &str, refspec: &str) -> Result<(), GitError> {
        self.run(&["push", "-q", remote, refspec]).map(drop)
    }

    /// `git push -u <remote> <branch>`
    pub fn push_set_upstream(&self, remote: &str, branch: &str) -> Result<(), GitError> {
        self.run(&["push", "-q", "-u", remote, branch]).map(drop)
    }

    /// `git push <remote> --delete <branch>`
    pub fn delete_remote_branch(&self, remote: &str, branch: &str) -> Result<(), GitError> {
        self.run(&["push", "-q", remote, "--delete", branch]).map(drop)
    }

    /// `git tag -a <name> -m <message>`
    pub fn create_annotated_tag(&self, name: &str, message: &str) -> Result<(), GitError> {
        self.run(&["tag", "-a", name, "-m", message]).map(drop)
    }

    /// Create an annotated tag and push it to origin.
    ///
    /// A rejected push deletes the local tag again, so the tag only exists
    /// locally once origin has it.
    pub fn create_and_push_tag(&self, name: &str, message: &str) -> Result<(), GitError> {
        self.create_annotated_tag(name, message)?;
        if let Err(e) = self.push_tag(name) {
            if let Err(cleanup) = self.run(&["tag", "-d", name]) {
                warn!("Failed to delete local tag {}: {}", name, cleanup);
            }
            return Err(e);
        }
        Ok(())
    }

    /// `git push origin refs/tags/<name>`
    pub fn push_tag(&self, name: &str) -> Result<(), GitError> {
        self.push("origin", &format!("refs/tags/{}", name))
    }

    /// Whether `remote` has `refs/tags/<name>`.
    pub fn remote_tag_exists(&self, remote: &str, name: &str) -> Result<bool, GitError> {
        let refname = format!("refs/tags/{}", name);
        let listing = self.run(&["ls-remote", "--tags", remote, &refname])?;
        Ok(!listing.trim().is_empty())
    }

    /// Delete a tag locally and on origin.
    pub fn delete_tag(&self, name: &str) -> Result<(), GitError> {
        self.run(&["tag", "-d", name])?;
        self.push("origin", &format!(":refs/tags/{}", name))
    }

    /// Discard staged and unstaged changes to tracked files.
    pub fn reset_hard(&self) -> Result<(), GitError> {
        self.run(&["reset", "-q", "--hard", "HEAD"]).map(drop)
    }

    /// Human-readable `git status` output.
    pub fn status_text(&self) -> Result<String, GitError> {
        self.run(&["status"])
    }

    /// Human-readable `git diff` output.
    pub fn diff_text(&self) -> Result<String, GitError> {
        self.run(&["diff"])
    }
}
