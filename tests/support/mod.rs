//! Shared fixtures: a workspace of working copies, each cloned from its own
//! bare origin so pulls, pushes and remote tags behave as in production.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

/// Run git in `dir`, panicking with stderr on failure.
pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("failed to spawn git");
    assert!(
        output.status.success(),
        "git {} failed: {}",
        args.join(" "),
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// A temporary workspace directory.
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("failed to create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Create `<workspace>/<name>` cloned from a bare origin, with `files`
    /// committed and pushed on master.
    pub fn repo(&self, name: &str, files: &[(&str, &str)]) -> WorkingCopy {
        let origins = self.path().join(".origins");
        fs::create_dir_all(&origins).unwrap();
        let origin = origins.join(format!("{}.git", name));
        git(
            self.path(),
            &["init", "-q", "--bare", origin.to_str().unwrap()],
        );
        git(&origin, &["symbolic-ref", "HEAD", "refs/heads/master"]);
        git(
            self.path(),
            &["clone", "-q", origin.to_str().unwrap(), name],
        );

        let clone = WorkingCopy {
            path: self.path().join(name),
            origin,
        };
        clone.git(&["symbolic-ref", "HEAD", "refs/heads/master"]);
        clone.git(&["config", "user.email", "release@example.com"]);
        clone.git(&["config", "user.name", "Release Bot"]);
        clone.git(&["config", "commit.gpgsign", "false"]);
        clone.git(&["config", "tag.gpgsign", "false"]);

        fs::write(clone.path.join("README.md"), format!("# {}\n", name)).unwrap();
        for (path, contents) in files {
            clone.write(path, contents);
        }
        clone.git(&["add", "-A"]);
        clone.git(&["commit", "-q", "-m", "Initial commit"]);
        clone.git(&["push", "-q", "-u", "origin", "master"]);
        clone
    }
}

/// A working copy and its bare origin.
pub struct WorkingCopy {
    pub path: PathBuf,
    pub origin: PathBuf,
}

impl WorkingCopy {
    pub fn git(&self, args: &[&str]) -> String {
        git(&self.path, args)
    }

    pub fn write(&self, path: &str, contents: &str) {
        let full = self.path.join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(full, contents).unwrap();
    }

    pub fn write_bytes(&self, path: &str, contents: &[u8]) {
        let full = self.path.join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(full, contents).unwrap();
    }

    pub fn read(&self, path: &str) -> String {
        fs::read_to_string(self.path.join(path)).unwrap()
    }

    pub fn read_bytes(&self, path: &str) -> Vec<u8> {
        fs::read(self.path.join(path)).unwrap()
    }

    /// Commit everything and push master.
    pub fn commit_all(&self, message: &str) {
        self.git(&["add", "-A"]);
        self.git(&["commit", "-q", "-m", message]);
        self.git(&["push", "-q", "origin", "master"]);
    }

    /// Make origin refuse every tag push until [`WorkingCopy::accept_tags`].
    #[cfg(unix)]
    pub fn reject_tags(&self) {
        use std::os::unix::fs::PermissionsExt;

        let hook = self.origin.join("hooks").join("pre-receive");
        fs::create_dir_all(hook.parent().unwrap()).unwrap();
        fs::write(
            &hook,
            "#!/bin/sh\nwhile read old new ref; do\n  case \"$ref\" in\n    refs/tags/*) echo \"tags are closed\" >&2; exit 1 ;;\n  esac\ndone\nexit 0\n",
        )
        .unwrap();
        fs::set_permissions(&hook, fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[cfg(unix)]
    pub fn accept_tags(&self) {
        fs::remove_file(self.origin.join("hooks").join("pre-receive")).unwrap();
    }

    /// Files changed by the newest commit on origin's master.
    pub fn origin_head_files(&self) -> Vec<String> {
        git(&self.origin, &["show", "--name-only", "--format=", "master"])
            .lines()
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect()
    }

    /// Commit everything and tag HEAD with each of `tags`, pushing to origin.
    pub fn release(&self, tags: &[&str]) {
        for tag in tags {
            self.write("VERSION", tag);
            self.git(&["add", "-A"]);
            self.git(&["commit", "-q", "-m", tag]);
            self.git(&["tag", tag]);
        }
        self.git(&["push", "-q", "origin", "master", "--tags"]);
    }

    /// Tag names on origin.
    pub fn origin_tags(&self) -> Vec<String> {
        git(&self.origin, &["tag", "--list"])
            .lines()
            .map(String::from)
            .collect()
    }

    /// Subject lines on origin's master, newest first.
    pub fn origin_log(&self) -> Vec<String> {
        git(&self.origin, &["log", "--format=%s", "master"])
            .lines()
            .map(String::from)
            .collect()
    }

    pub fn current_branch(&self) -> String {
        self.git(&["rev-parse", "--abbrev-ref", "HEAD"])
            .trim()
            .to_string()
    }
}
