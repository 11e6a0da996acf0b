//! ci::fly
//!
//! Concourse control plane via the `fly` CLI.
//!
//! # Design
//!
//! Commands run in the foreground with stdin inherited (scripts may prompt)
//! and stdout/stderr teed: echoed to the operator as they arrive and
//! captured for the error value when the command fails.
//!
//! # Script discovery
//!
//! 1. An explicit script (`FLY_SCRIPT`), relative to the CI directory unless
//!    absolute. It must exist.
//! 2. Otherwise every regular file in the CI directory whose name starts
//!    with `fly`.
//!
//! Scripts must be executable before they are run.

use std::io::{BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::{debug, info};

use super::traits::{PipelineError, Pipelines};

/// Name of the CLI looked up on `PATH`.
pub const FLY_EXECUTABLE: &str = "fly";

/// The `fly` CLI.
#[derive(Debug, Clone)]
pub struct Fly {
    executable: PathBuf,
    script_override: Option<PathBuf>,
}

impl Fly {
    /// Locate `fly`: an explicit path must be an executable file, otherwise
    /// the first executable `fly` on `PATH` is used.
    pub fn locate(
        explicit: Option<&Path>,
        script_override: Option<PathBuf>,
    ) -> Result<Self, PipelineError> {
        let executable = match explicit {
            Some(path) => {
                if !path.is_file() {
                    return Err(PipelineError::ExecutableNotFound(format!(
                        "{} does not exist",
                        path.display()
                    )));
                }
                if !is_executable(path) {
                    return Err(PipelineError::NotExecutable {
                        path: path.to_path_buf(),
                    });
                }
                path.to_path_buf()
            }
            None => find_on_path(FLY_EXECUTABLE).ok_or_else(|| {
                PipelineError::ExecutableNotFound(format!("{} not found in PATH", FLY_EXECUTABLE))
            })?,
        };

        Ok(Self {
            executable,
            script_override,
        })
    }

    /// Use a known executable without checks.
    pub fn with_executable(executable: PathBuf, script_override: Option<PathBuf>) -> Self {
        Self {
            executable,
            script_override,
        }
    }

    /// The resolved executable.
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    fn fly(&self, args: Vec<String>) -> Result<(), PipelineError> {
        run_teed(&self.executable, &args, None)
    }
}

impl Pipelines for Fly {
    fn unpause_pipeline(&self, target: &str, pipeline: &str) -> Result<(), PipelineError> {
        info!("Unpausing pipeline {} on {}", pipeline, target);
        self.fly(unpause_args(target, pipeline))
    }

    fn trigger_job(&self, target: &str, job: &str, watch: bool) -> Result<(), PipelineError> {
        info!("Triggering job {} on {}", job, target);
        self.fly(trigger_args(target, job, watch))
    }

    fn watch_job(&self, target: &str, job: &str) -> Result<(), PipelineError> {
        info!("Watching job {} on {}", job, target);
        self.fly(watch_args(target, job))
    }

    fn destroy_pipeline(&self, target: &str, pipeline: &str) -> Result<(), PipelineError> {
        info!("Destroying pipeline {} on {}", pipeline, target);
        self.fly(destroy_args(target, pipeline))
    }

    fn find_fly_scripts(&self, ci_dir: &Path) -> Result<Vec<PathBuf>, PipelineError> {
        find_fly_scripts(ci_dir, self.script_override.as_deref())
    }

    fn run_fly_script(
        &self,
        script: &Path,
        args: &[String],
        cwd: &Path,
    ) -> Result<(), PipelineError> {
        if !is_executable(script) {
            return Err(PipelineError::NotExecutable {
                path: script.to_path_buf(),
            });
        }
        info!("Running {}", script.display());
        run_teed(script, args, Some(cwd))
    }
}

pub fn unpause_args(target: &str, pipeline: &str) -> Vec<String> {
    strings(&["-t", target, "unpause-pipeline", "-p", pipeline])
}

pub fn trigger_args(target: &str, job: &str, watch: bool) -> Vec<String> {
    let mut args = strings(&["-t", target, "trigger-job", "-j", job]);
    if watch {
        args.push("-w".to_string());
    }
    args
}

pub fn watch_args(target: &str, job: &str) -> Vec<String> {
    strings(&["-t", target, "watch", "-j", job])
}

pub fn destroy_args(target: &str, pipeline: &str) -> Vec<String> {
    strings(&["-t", target, "destroy-pipeline", "-p", pipeline, "-n"])
}

fn strings(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}

/// Find pipeline-definition scripts in `ci_dir`.
pub fn find_fly_scripts(
    ci_dir: &Path,
    explicit: Option<&Path>,
) -> Result<Vec<PathBuf>, PipelineError> {
    if !ci_dir.is_dir() {
        return Err(PipelineError::NoCiDir {
            path: ci_dir.to_path_buf(),
        });
    }

    if let Some(script) = explicit {
        let path = if script.is_absolute() {
            script.to_path_buf()
        } else {
            ci_dir.join(script)
        };
        return if path.is_file() {
            Ok(vec![path])
        } else {
            Err(PipelineError::NoScript {
                dir: ci_dir.to_path_buf(),
            })
        };
    }

    let entries = std::fs::read_dir(ci_dir).map_err(|source| PipelineError::Spawn {
        command: format!("read_dir {}", ci_dir.display()),
        source,
    })?;

    let mut scripts: Vec<PathBuf> = entries
        .flatten()
        .filter(|e| e.file_name().to_string_lossy().starts_with("fly"))
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .collect();
    scripts.sort();

    if scripts.is_empty() {
        return Err(PipelineError::NoScript {
            dir: ci_dir.to_path_buf(),
        });
    }
    Ok(scripts)
}

fn find_on_path(name: &str) -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file() && is_executable(candidate))
}

#[cfg(unix)]
pub(crate) fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
pub(crate) fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Run a program, echoing its output while capturing it.
fn run_teed(program: &Path, args: &[String], cwd: Option<&Path>) -> Result<(), PipelineError> {
    let command = std::iter::once(program.display().to_string())
        .chain(args.iter().cloned())
        .collect::<Vec<_>>()
        .join(" ");
    debug!("{}", command);

    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }

    let mut child = cmd.spawn().map_err(|source| PipelineError::Spawn {
        command: command.clone(),
        source,
    })?;

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let (out, err) = std::thread::scope(|scope| {
        let err_reader = scope.spawn(move || tee(stderr, std::io::stderr()));
        let out = tee(stdout, std::io::stdout());
        let err = err_reader.join().unwrap_or_default();
        (out, err)
    });

    let status = child.wait().map_err(|source| PipelineError::Spawn {
        command: command.clone(),
        source,
    })?;

    if !status.success() {
        let mut output = out;
        output.push_str(&err);
        return Err(PipelineError::CommandFailed {
            command,
            code: status.code().unwrap_or(-1),
            output,
        });
    }
    Ok(())
}

/// Copy `source` to `sink` line by line and return what was read. Bytes are
/// echoed as-is; the capture is lossy UTF-8. Reading continues to EOF so the
/// child never sees a closed pipe.
fn tee<R: Read, W: Write>(source: Option<R>, mut sink: W) -> String {
    let Some(source) = source else {
        return String::new();
    };
    let mut reader = BufReader::new(source);
    let mut captured = Vec::new();
    let mut line = Vec::new();
    loop {
        line.clear();
        match reader.read_until(b'\n', &mut line) {
            Ok(0) => break,
            Ok(_) => {
                let _ = sink.write_all(&line);
                captured.extend_from_slice(&line);
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(_) => break,
        }
    }
    let _ = sink.flush();
    String::from_utf8_lossy(&captured).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    mod args {
        use super::*;

        #[test]
        fn unpause() {
            assert_eq!(
                unpause_args("tkgi-pipeline-upgrade", "tkgi-r-release"),
                vec!["-t", "tkgi-pipeline-upgrade", "unpause-pipeline", "-p", "tkgi-r-release"]
            );
        }

        #[test]
        fn trigger_with_and_without_watch() {
            assert_eq!(
                trigger_args("f", "p/j", false),
                vec!["-t", "f", "trigger-job", "-j", "p/j"]
            );
            assert_eq!(
                trigger_args("f", "p/j", true),
                vec!["-t", "f", "trigger-job", "-j", "p/j", "-w"]
            );
        }

        #[test]
        fn watch_and_destroy() {
            assert_eq!(watch_args("t", "p/j"), vec!["-t", "t", "watch", "-j", "p/j"]);
            assert_eq!(
                destroy_args("t", "p"),
                vec!["-t", "t", "destroy-pipeline", "-p", "p", "-n"]
            );
        }
    }

    mod discovery {
        use super::*;

        fn ci_dir_with(files: &[&str]) -> TempDir {
            let temp = TempDir::new().unwrap();
            for f in files {
                fs::write(temp.path().join(f), "#!/bin/sh\n").unwrap();
            }
            temp
        }

        #[test]
        fn missing_ci_dir() {
            let temp = TempDir::new().unwrap();
            let missing = temp.path().join("ci");
            assert!(matches!(
                find_fly_scripts(&missing, None),
                Err(PipelineError::NoCiDir { .. })
            ));
        }

        #[test]
        fn no_matching_script() {
            let ci = ci_dir_with(&["deploy.sh"]);
            assert!(matches!(
                find_fly_scripts(ci.path(), None),
                Err(PipelineError::NoScript { .. })
            ));
        }

        #[test]
        fn lists_every_candidate_sorted() {
            let ci = ci_dir_with(&["fly.sh", "deploy.sh", "fly-release.sh"]);
            fs::create_dir(ci.path().join("fly-dir")).unwrap();
            let scripts = find_fly_scripts(ci.path(), None).unwrap();
            let names: Vec<_> = scripts
                .iter()
                .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
                .collect();
            assert_eq!(names, vec!["fly-release.sh", "fly.sh"]);
        }

        #[test]
        fn explicit_script_relative_to_ci_dir() {
            let ci = ci_dir_with(&["fly.sh", "custom.sh"]);
            let scripts = find_fly_scripts(ci.path(), Some(Path::new("custom.sh"))).unwrap();
            assert_eq!(scripts, vec![ci.path().join("custom.sh")]);
        }

        #[test]
        fn explicit_script_must_exist() {
            let ci = ci_dir_with(&["fly.sh"]);
            assert!(find_fly_scripts(ci.path(), Some(Path::new("nope.sh"))).is_err());
        }
    }

    #[cfg(unix)]
    mod execution {
        use super::*;
        use std::os::unix::fs::PermissionsExt;

        fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
            let path = dir.join(name);
            fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        #[test]
        fn non_executable_script_is_rejected() {
            let temp = TempDir::new().unwrap();
            let path = temp.path().join("fly.sh");
            fs::write(&path, "#!/bin/sh\n").unwrap();
            let fly = Fly::with_executable(PathBuf::from("fly"), None);
            assert!(matches!(
                fly.run_fly_script(&path, &[], temp.path()),
                Err(PipelineError::NotExecutable { .. })
            ));
        }

        #[test]
        fn failing_script_carries_code_and_output() {
            let temp = TempDir::new().unwrap();
            let path = script(temp.path(), "fly.sh", "echo out-$1; echo err >&2; exit 3");
            let fly = Fly::with_executable(PathBuf::from("fly"), None);

            let err = fly
                .run_fly_script(&path, &["x".to_string()], temp.path())
                .unwrap_err();
            match err {
                PipelineError::CommandFailed { code, output, command } => {
                    assert_eq!(code, 3);
                    assert!(output.contains("out-x"));
                    assert!(output.contains("err"));
                    assert!(command.ends_with("fly.sh x"));
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }

        #[test]
        fn binary_output_does_not_fail_a_successful_script() {
            let temp = TempDir::new().unwrap();
            let path = script(
                temp.path(),
                "fly.sh",
                "printf '\\377\\n'; head -c 100000 /dev/zero | tr '\\0' 'a'; echo; exit 0",
            );
            let fly = Fly::with_executable(PathBuf::from("fly"), None);

            assert!(fly.run_fly_script(&path, &[], temp.path()).is_ok());
        }

        #[test]
        fn binary_output_is_captured_lossily() {
            let captured = tee(Some(&b"ok\n\xff\nafter\n"[..]), std::io::sink());
            assert_eq!(captured, "ok\n\u{fffd}\nafter\n");
        }

        #[test]
        fn script_runs_in_cwd() {
            let temp = TempDir::new().unwrap();
            let path = script(temp.path(), "fly.sh", "touch ran-here");
            let fly = Fly::with_executable(PathBuf::from("fly"), None);
            fly.run_fly_script(&path, &[], temp.path()).unwrap();
            assert!(temp.path().join("ran-here").exists());
        }

        #[test]
        fn fly_commands_use_configured_executable() {
            let temp = TempDir::new().unwrap();
            let log = temp.path().join("calls");
            let fake = script(
                temp.path(),
                "fly",
                &format!("echo \"$@\" >> {}", log.display()),
            );
            let fly = Fly::locate(Some(&fake), None).unwrap();

            fly.unpause_pipeline("t", "p").unwrap();
            fly.trigger_job("t", "p/j", true).unwrap();

            let calls = fs::read_to_string(&log).unwrap();
            assert_eq!(calls, "-t t unpause-pipeline -p p\n-t t trigger-job -j p/j -w\n");
        }

        #[test]
        fn locate_rejects_missing_explicit_path() {
            assert!(matches!(
                Fly::locate(Some(Path::new("/no/such/fly")), None),
                Err(PipelineError::ExecutableNotFound(_))
            ));
        }
    }
}
