//! Integration tests for the params reconciler.
//!
//! Every test builds a workspace holding a source repository and a params
//! repository, each with its own bare origin, and drives the reconciler with
//! scripted answers.

mod support;

use pipeline_helpers::core::naming::{resolve_repo, RepoRef, DEFAULT_OWNER};
use pipeline_helpers::core::types::ReleaseVersion;
use pipeline_helpers::release::{ReconcileError, ReconcileOptions, ReconcileOutcome, Reconciler};
use pipeline_helpers::ui::prompts::{Answer, ScriptedPrompter};

use support::{WorkingCopy, Workspace};

const FOUNDATION_FILE: &str = "foundations/cml-k8s-n-01/cml-k8s-n-01-ns-mgmt.yml";
const OTHER_FOUNDATION_FILE: &str = "foundations/cml-k8s-n-02/cml-k8s-n-02-ns-mgmt.yml";
const UNRELATED_FILE: &str = "foundations/cml-k8s-n-01/cml-k8s-n-01-other-repo.yml";
const NEW_FOUNDATION_FILE: &str = "foundations/cml-k8s-n-03/cml-k8s-n-03-ns-mgmt.yml";

struct Fixture {
    workspace: Workspace,
    source: WorkingCopy,
    params: WorkingCopy,
}

impl Fixture {
    fn new(tags: &[&str], params_files: &[(&str, &str)]) -> Self {
        let workspace = Workspace::new();
        let source = workspace.repo("ns-mgmt", &[("ci/fly.sh", "#!/bin/sh\n")]);
        if !tags.is_empty() {
            source.release(tags);
        }
        let params = workspace.repo("params", params_files);
        Self {
            workspace,
            source,
            params,
        }
    }

    fn repos(&self) -> (RepoRef, RepoRef) {
        (
            resolve_repo("ns-mgmt", DEFAULT_OWNER, self.workspace.path()),
            resolve_repo("params", DEFAULT_OWNER, self.workspace.path()),
        )
    }

    fn reconcile(
        &self,
        prompter: &ScriptedPrompter,
        dry_run: bool,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        let (repo, params) = self.repos();
        let options = ReconcileOptions {
            dry_run,
            ..ReconcileOptions::default()
        };
        Reconciler::new(&repo, &params, prompter, options).reconcile()
    }
}

fn pinned(version: &str) -> String {
    format!("foundation: cml-k8s-n-01\ngit_release_tag: {}\nreplicas: 3\n", version)
}

fn standard() -> Fixture {
    Fixture::new(
        &["release-v1.0.0", "release-v1.1.0"],
        &[
            (FOUNDATION_FILE, &pinned("release-v1.0.0")),
            (OTHER_FOUNDATION_FILE, &pinned("release-v1.0.0")),
            (UNRELATED_FILE, &pinned("release-v1.0.0")),
        ],
    )
}

mod apply {
    use super::*;

    #[test]
    fn rewrites_every_foundation_and_tags() {
        let fx = standard();
        let prompter = ScriptedPrompter::new([Answer::Yes, Answer::Yes]);

        let outcome = fx.reconcile(&prompter, false).unwrap();

        match outcome {
            ReconcileOutcome::Applied(delta) => {
                assert_eq!(delta.from, ReleaseVersion::new(1, 0, 0));
                assert_eq!(delta.to, ReleaseVersion::new(1, 1, 0));
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(fx.params.read(FOUNDATION_FILE), pinned("release-v1.1.0"));
        assert_eq!(fx.params.read(OTHER_FOUNDATION_FILE), pinned("release-v1.1.0"));
        assert_eq!(fx.params.read(UNRELATED_FILE), pinned("release-v1.0.0"));
        assert_eq!(
            prompter.asked(),
            vec![
                "Do you want to continue?".to_string(),
                "Do you want to continue with these commits?".to_string(),
            ]
        );
    }

    #[test]
    fn pushes_commit_and_tag_to_origin() {
        let fx = standard();
        let prompter = ScriptedPrompter::new([Answer::Yes, Answer::Yes]);

        fx.reconcile(&prompter, false).unwrap();

        assert_eq!(
            fx.params.origin_log().first().map(String::as_str),
            Some("Update git_release_tag from release-v1.0.0 to release-v1.1.0")
        );
        assert!(fx
            .params
            .origin_tags()
            .contains(&"ns-mgmt-release-v1.1.0".to_string()));
    }

    #[test]
    fn leaves_params_on_mainline_without_work_branch() {
        let fx = standard();
        let prompter = ScriptedPrompter::new([Answer::Yes, Answer::Yes]);

        fx.reconcile(&prompter, false).unwrap();

        assert_eq!(fx.params.current_branch(), "master");
        let branches = fx.params.git(&["branch", "--list"]);
        assert!(!branches.contains("ns-mgmt-release-v1.1.0"));
        assert!(fx.params.git(&["status", "--porcelain"]).trim().is_empty());
    }

    #[test]
    fn second_run_is_already_current() {
        let fx = standard();
        fx.reconcile(&ScriptedPrompter::new([Answer::Yes, Answer::Yes]), false)
            .unwrap();

        let prompter = ScriptedPrompter::new([Answer::Yes]);
        let outcome = fx.reconcile(&prompter, false).unwrap();

        assert!(matches!(outcome, ReconcileOutcome::AlreadyCurrent(_)));
        assert_eq!(prompter.remaining(), 0);
    }

    #[test]
    fn longer_version_is_not_rewritten() {
        let fx = Fixture::new(
            &["release-v1.2.3", "release-v1.2.4"],
            &[
                (FOUNDATION_FILE, &pinned("release-v1.2.3")),
                (OTHER_FOUNDATION_FILE, &pinned("release-v1.2.30")),
            ],
        );
        let prompter = ScriptedPrompter::new([Answer::Yes, Answer::Yes]);

        fx.reconcile(&prompter, false).unwrap();

        assert_eq!(fx.params.read(FOUNDATION_FILE), pinned("release-v1.2.4"));
        assert_eq!(fx.params.read(OTHER_FOUNDATION_FILE), pinned("release-v1.2.30"));
    }

    #[test]
    fn first_release_only_tags() {
        let fx = Fixture::new(
            &["release-v1.0.0"],
            &[(FOUNDATION_FILE, &pinned("release-v1.0.0"))],
        );
        let prompter = ScriptedPrompter::new([Answer::Yes, Answer::Yes]);

        let outcome = fx.reconcile(&prompter, false).unwrap();

        assert!(matches!(outcome, ReconcileOutcome::Applied(_)));
        assert_eq!(
            prompter.asked().last().map(String::as_str),
            Some("Do you want to create the ns-mgmt-release-v1.0.0 tag?")
        );
        assert!(fx
            .params
            .origin_tags()
            .contains(&"ns-mgmt-release-v1.0.0".to_string()));
        assert_eq!(fx.params.origin_log().len(), 1);
    }

    #[test]
    fn only_rewritten_files_are_committed() {
        let fx = standard();
        fx.params.write("scratch-notes.txt", "wip\n");
        let prompter = ScriptedPrompter::new([Answer::Yes, Answer::Yes]);

        let outcome = fx.reconcile(&prompter, false).unwrap();

        assert!(matches!(outcome, ReconcileOutcome::Applied(_)));
        assert_eq!(
            fx.params.origin_head_files(),
            vec![FOUNDATION_FILE.to_string(), OTHER_FOUNDATION_FILE.to_string()]
        );
        assert_eq!(fx.params.read("scratch-notes.txt"), "wip\n");
        assert_eq!(
            fx.params.git(&["status", "--porcelain"]).trim(),
            "?? scratch-notes.txt"
        );
    }
}

mod decline {
    use super::*;

    #[test]
    fn declining_start_touches_nothing() {
        let fx = standard();
        let prompter = ScriptedPrompter::new([Answer::No]);

        let outcome = fx.reconcile(&prompter, false).unwrap();

        assert_eq!(outcome, ReconcileOutcome::Declined);
        assert_eq!(fx.params.read(FOUNDATION_FILE), pinned("release-v1.0.0"));
        assert!(fx.params.origin_tags().is_empty());
    }

    #[test]
    fn declining_review_discards_rewrites() {
        let fx = standard();
        let prompter = ScriptedPrompter::new([Answer::Yes, Answer::No]);

        let outcome = fx.reconcile(&prompter, false).unwrap();

        assert_eq!(outcome, ReconcileOutcome::Declined);
        assert_eq!(fx.params.read(FOUNDATION_FILE), pinned("release-v1.0.0"));
        assert!(fx.params.git(&["status", "--porcelain"]).trim().is_empty());
        assert!(fx.params.git(&["tag", "--list"]).trim().is_empty());
        assert_eq!(fx.params.origin_log(), vec!["Initial commit".to_string()]);
    }
}

mod failures {
    use super::*;

    #[test]
    fn no_release_tags() {
        let fx = Fixture::new(&[], &[(FOUNDATION_FILE, &pinned("release-v1.0.0"))]);
        let prompter = ScriptedPrompter::new([]);

        let err = fx.reconcile(&prompter, false).unwrap_err();

        assert!(matches!(err, ReconcileError::NoReleaseTags { .. }));
        assert!(err.is_recoverable());
        assert!(prompter.asked().is_empty());
        assert_eq!(fx.params.read(FOUNDATION_FILE), pinned("release-v1.0.0"));
        assert!(fx.params.git(&["status", "--porcelain"]).trim().is_empty());
        assert!(fx.params.origin_tags().is_empty());
        assert_eq!(fx.params.origin_log(), vec!["Initial commit".to_string()]);
    }

    #[test]
    fn unreadable_params_file_fails_before_writing() {
        let fx = standard();
        let mut garbled = pinned("release-v1.0.0").into_bytes();
        garbled.extend_from_slice(b"notes: \xff\xfe\n");
        fx.params.write_bytes(NEW_FOUNDATION_FILE, &garbled);
        fx.params.commit_all("Add cml-k8s-n-03");
        let prompter = ScriptedPrompter::new([Answer::Yes, Answer::Yes]);

        let err = fx.reconcile(&prompter, false).unwrap_err();

        match &err {
            ReconcileError::FileRewrite { path, .. } => {
                assert!(path.ends_with(NEW_FOUNDATION_FILE));
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert!(err.is_recoverable());
        assert_eq!(fx.params.read(FOUNDATION_FILE), pinned("release-v1.0.0"));
        assert_eq!(fx.params.read_bytes(NEW_FOUNDATION_FILE), garbled);
        assert!(fx.params.git(&["status", "--porcelain"]).trim().is_empty());
        assert!(fx.params.git(&["tag", "--list"]).trim().is_empty());
        assert!(fx.params.origin_tags().is_empty());
        assert_eq!(
            fx.params.origin_log(),
            vec!["Add cml-k8s-n-03".to_string(), "Initial commit".to_string()]
        );
    }

    #[test]
    fn untracked_params_file_is_refused() {
        let fx = standard();
        fx.params.write(NEW_FOUNDATION_FILE, &pinned("release-v1.0.0"));
        let prompter = ScriptedPrompter::new([Answer::Yes, Answer::Yes]);

        let err = fx.reconcile(&prompter, false).unwrap_err();

        assert!(matches!(err, ReconcileError::DirtyWorkingTree { .. }));
        assert_eq!(prompter.remaining(), 1);
        assert_eq!(fx.params.read(NEW_FOUNDATION_FILE), pinned("release-v1.0.0"));
        assert_eq!(fx.params.read(FOUNDATION_FILE), pinned("release-v1.0.0"));
        assert!(fx.params.git(&["tag", "--list"]).trim().is_empty());
        assert_eq!(fx.params.origin_log(), vec!["Initial commit".to_string()]);
    }

    #[cfg(unix)]
    #[test]
    fn rejected_tag_push_is_retried_on_next_run() {
        let fx = standard();
        fx.params.reject_tags();

        let err = fx
            .reconcile(&ScriptedPrompter::new([Answer::Yes, Answer::Yes]), false)
            .unwrap_err();

        assert!(matches!(err, ReconcileError::VersionControl(_)));
        assert!(fx.params.git(&["tag", "--list"]).trim().is_empty());
        assert!(fx.params.origin_tags().is_empty());

        fx.params.accept_tags();
        let prompter = ScriptedPrompter::new([Answer::Yes, Answer::Yes]);
        let outcome = fx.reconcile(&prompter, false).unwrap();

        assert!(matches!(outcome, ReconcileOutcome::Applied(_)));
        assert_eq!(
            prompter.asked().last().map(String::as_str),
            Some("Do you want to create the ns-mgmt-release-v1.1.0 tag?")
        );
        assert_eq!(fx.params.origin_tags(), vec!["ns-mgmt-release-v1.1.0".to_string()]);
    }

    #[test]
    fn local_tag_missing_on_origin_is_pushed() {
        let fx = Fixture::new(
            &["release-v1.0.0"],
            &[(FOUNDATION_FILE, &pinned("release-v1.0.0"))],
        );
        fx.params.git(&[
            "tag",
            "-a",
            "ns-mgmt-release-v1.0.0",
            "-m",
            "Version ns-mgmt-release-v1.0.0",
        ]);
        let prompter = ScriptedPrompter::new([Answer::Yes, Answer::Yes]);

        let outcome = fx.reconcile(&prompter, false).unwrap();

        assert!(matches!(outcome, ReconcileOutcome::Applied(_)));
        assert_eq!(fx.params.origin_tags(), vec!["ns-mgmt-release-v1.0.0".to_string()]);
    }

    #[test]
    fn dirty_params_is_left_untouched() {
        let fx = standard();
        let dirty = "git_release_tag: release-v0.9.0\n";
        fx.params.write(FOUNDATION_FILE, dirty);
        let prompter = ScriptedPrompter::new([Answer::Yes]);

        let err = fx.reconcile(&prompter, false).unwrap_err();

        assert!(matches!(err, ReconcileError::DirtyWorkingTree { .. }));
        assert_eq!(fx.params.read(FOUNDATION_FILE), dirty);
        assert_eq!(fx.params.read(OTHER_FOUNDATION_FILE), pinned("release-v1.0.0"));
    }
}

mod dry_run {
    use super::*;

    #[test]
    fn changes_nothing_and_asks_nothing() {
        let fx = standard();
        let prompter = ScriptedPrompter::new([]);

        let outcome = fx.reconcile(&prompter, true).unwrap();

        assert!(matches!(outcome, ReconcileOutcome::DryRun(_)));
        assert!(prompter.asked().is_empty());
        assert_eq!(fx.params.read(FOUNDATION_FILE), pinned("release-v1.0.0"));
        assert!(fx.params.origin_tags().is_empty());
    }
}
