//! release::params
//!
//! Pinned release tags in a params working copy.
//!
//! A params file belongs to a repository when its name ends with
//! `-<repo>.yml` or `.<repo>.yaml`. It pins a release with a line of the
//! form `git_release_tag: release-v1.2.3`. Rewrites are literal: only the
//! exact old tag text is replaced, so `release-v1.2.30` is never touched
//! when moving off `release-v1.2.3`.
//!
//! Rewrites are planned in memory ([`plan_rewrites`]) before anything is
//! written ([`apply_rewrites`]), so a read failure leaves the tree as it was.
//! Each rewrite keeps the text it replaces: a failed apply puts back what it
//! already wrote, and [`restore_rewrites`] undoes a whole plan.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::core::types::ReleaseVersion;

/// Key that pins a release in params files.
pub const RELEASE_TAG_KEY: &str = "git_release_tag";

/// One planned file rewrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub path: PathBuf,
    /// Contents before the rewrite.
    pub original: String,
    pub contents: String,
    /// Occurrences replaced.
    pub replacements: usize,
}

/// `git_release_tag: release-v<version>`
pub fn release_tag_line(version: &ReleaseVersion) -> String {
    format!("{}: release-{}", RELEASE_TAG_KEY, version.as_ref_string())
}

/// Whether `file_name` is a params file for `repo`.
pub fn is_params_file_for(file_name: &str, repo: &str) -> bool {
    file_name.ends_with(&format!("-{}.yml", repo))
        || file_name.ends_with(&format!(".{}.yaml", repo))
}

/// Every params file for `repo` under `root`, sorted. `.git` is skipped.
pub fn find_params_files(root: &Path, repo: &str) -> io::Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    walk(root, repo, &mut found)?;
    found.sort();
    Ok(found)
}

fn walk(dir: &Path, repo: &str, found: &mut Vec<PathBuf>) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let name = entry.file_name();
        let name = name.to_string_lossy();

        if file_type.is_dir() {
            if name != ".git" {
                walk(&entry.path(), repo, found)?;
            }
        } else if file_type.is_file() && is_params_file_for(&name, repo) {
            found.push(entry.path());
        }
    }
    Ok(())
}

/// Plan the rewrite of every params file for `repo` that pins `from`.
///
/// Files without an exact match are not part of the plan.
pub fn plan_rewrites(
    root: &Path,
    repo: &str,
    from: &ReleaseVersion,
    to: &ReleaseVersion,
) -> Result<Vec<Rewrite>, (PathBuf, io::Error)> {
    let old = release_tag_line(from);
    let new = release_tag_line(to);

    let files = find_params_files(root, repo).map_err(|e| (root.to_path_buf(), e))?;
    let mut plan = Vec::new();
    for path in files {
        let contents = fs::read_to_string(&path).map_err(|e| (path.clone(), e))?;
        let (rewritten, replacements) = replace_exact(&contents, &old, &new);
        if replacements > 0 && old != new {
            plan.push(Rewrite {
                original: contents,
                contents: rewritten,
                path,
                replacements,
            });
        }
    }
    Ok(plan)
}

/// Replace `old` with `new` where `old` is not followed by more version text.
fn replace_exact(contents: &str, old: &str, new: &str) -> (String, usize) {
    let mut out = String::with_capacity(contents.len());
    let mut count = 0;
    let mut rest = contents;
    while let Some(at) = rest.find(old) {
        let end = at + old.len();
        let continues = rest[end..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_digit() || c == '.');
        out.push_str(&rest[..at]);
        if continues {
            out.push_str(old);
        } else {
            out.push_str(new);
            count += 1;
        }
        rest = &rest[end..];
    }
    out.push_str(rest);
    (out, count)
}

/// Write planned rewrites.
///
/// Stops at the first failure and restores the files written before it.
pub fn apply_rewrites(plan: &[Rewrite]) -> Result<(), (PathBuf, io::Error)> {
    for (done, rewrite) in plan.iter().enumerate() {
        if let Err(e) = fs::write(&rewrite.path, &rewrite.contents) {
            if let Err((path, restore)) = restore_rewrites(&plan[..done]) {
                warn!("Failed to restore {}: {}", path.display(), restore);
            }
            return Err((rewrite.path.clone(), e));
        }
    }
    Ok(())
}

/// Put back the contents each rewrite replaced. Every file is attempted;
/// the first failure is returned.
pub fn restore_rewrites(plan: &[Rewrite]) -> Result<(), (PathBuf, io::Error)> {
    let mut first_failure = None;
    for rewrite in plan {
        if let Err(e) = fs::write(&rewrite.path, &rewrite.original) {
            first_failure.get_or_insert((rewrite.path.clone(), e));
        }
    }
    first_failure.map_or(Ok(()), Err)
}
