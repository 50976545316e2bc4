//! The PR triage engine.
//!
//! Two independent pipelines operate on a pull request's change set:
//!
//! - **Labels**: fetch the changed files, classify them against the rule
//!   table, submit the resulting label set in one call.
//! - **Reviewers**: derive the changed packages, resolve their maintainers
//!   (minus the PR author), request reviews from those with write access,
//!   and invite + ping the rest.
//!
//! All GitHub access goes through the [`GithubApi`] seam and all maintainer
//! lookups through [`maintainers::MaintainerLookup`], so both pipelines are
//! testable without the network. Everything here is scoped to a single
//! webhook delivery; nothing persists across events.

pub mod changes;
pub mod comments;
pub mod labels;
pub mod maintainers;
pub mod reviewers;

use std::collections::BTreeSet;

use tracing::{error, info, warn};

use crate::github::{GithubApi, UpstreamApiError};
use crate::types::PrNumber;
use crate::webhooks::TriagePipeline;

use maintainers::{MaintainerLookup, MaintainerResolution};
use reviewers::ReviewerAssignment;

/// The outcome of triaging one pull request, scoped to one delivery.
#[derive(Debug, Clone, Default)]
pub struct TriageResult {
    /// Labels submitted to the PR.
    pub labels: BTreeSet<&'static str>,

    /// Maintainer resolution (packages with/without maintainers, union set).
    pub resolution: MaintainerResolution,

    /// Reviewer assignment derived from the resolution.
    pub assignment: ReviewerAssignment,
}

/// Runs the label pipeline: classify the change set and add labels.
pub async fn run_label_pipeline<A: GithubApi>(
    api: &A,
    pr: PrNumber,
) -> Result<BTreeSet<&'static str>, UpstreamApiError> {
    let files = api.list_pull_request_files(pr).await?;
    let labels = labels::classify(&files);

    info!(pr = %pr, labels = ?labels, "classified pull request");

    if !labels.is_empty() {
        let labels: Vec<String> = labels.iter().map(|l| l.to_string()).collect();
        api.add_labels(pr, &labels).await?;
    }

    Ok(labels)
}

/// Runs the reviewer pipeline: resolve maintainers and assign reviewers.
pub async fn run_reviewer_pipeline<A: GithubApi, L: MaintainerLookup>(
    api: &A,
    lookup: &L,
    pr: PrNumber,
    author: &str,
) -> Result<(MaintainerResolution, ReviewerAssignment), UpstreamApiError> {
    let files = api.list_pull_request_files(pr).await?;
    let resolution = maintainers::resolve(lookup, &files, author).await;
    let assignment = reviewers::assign_reviewers(api, pr, author, &resolution).await?;
    Ok((resolution, assignment))
}

/// Runs the given pipelines in order, isolating their failures.
///
/// A failed pipeline is logged and the remaining pipelines still run; the
/// returned [`TriageResult`] reflects whatever did succeed. `lookup` is
/// `None` when no maintainer source is available (the upstream checkout
/// failed), in which case reviewer assignment is skipped rather than run
/// against nothing.
pub async fn run_pipelines<A: GithubApi, L: MaintainerLookup>(
    api: &A,
    lookup: Option<&L>,
    pr: PrNumber,
    author: &str,
    pipelines: &[TriagePipeline],
) -> TriageResult {
    let mut result = TriageResult::default();

    for pipeline in pipelines {
        match pipeline {
            TriagePipeline::Labels => match run_label_pipeline(api, pr).await {
                Ok(labels) => result.labels = labels,
                Err(e) => error!(pr = %pr, error = %e, "label pipeline failed"),
            },
            TriagePipeline::Reviewers => {
                let Some(lookup) = lookup else {
                    warn!(pr = %pr, "no maintainer lookup available, skipping reviewer assignment");
                    continue;
                };
                match run_reviewer_pipeline(api, lookup, pr, author).await {
                    Ok((resolution, assignment)) => {
                        result.resolution = resolution;
                        result.assignment = assignment;
                    }
                    Err(e) => error!(pr = %pr, error = %e, "reviewer pipeline failed"),
                }
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use changes::{ChangeSetEntry, FileStatus};
    use std::collections::{BTreeMap, HashMap};
    use std::sync::Mutex;

    use crate::github::PermissionLevel;
    use crate::workspace::WorkspaceError;

    /// Fake API serving a fixed file list, with per-operation failure
    /// injection and call recording.
    #[derive(Default)]
    struct FakeApi {
        files: Vec<ChangeSetEntry>,
        permissions: HashMap<String, PermissionLevel>,
        fail_add_labels: bool,
        fail_permission: bool,
        label_calls: Mutex<Vec<Vec<String>>>,
        reviewer_calls: Mutex<Vec<Vec<String>>>,
        comments: Mutex<Vec<String>>,
    }

    impl FakeApi {
        fn with_files(files: Vec<ChangeSetEntry>) -> Self {
            FakeApi {
                files,
                ..FakeApi::default()
            }
        }

        fn permission(mut self, user: &str, level: PermissionLevel) -> Self {
            self.permissions.insert(user.to_string(), level);
            self
        }
    }

    impl GithubApi for FakeApi {
        async fn list_pull_request_files(
            &self,
            _pr: PrNumber,
        ) -> Result<Vec<ChangeSetEntry>, UpstreamApiError> {
            Ok(self.files.clone())
        }

        async fn add_labels(
            &self,
            _pr: PrNumber,
            labels: &[String],
        ) -> Result<(), UpstreamApiError> {
            if self.fail_add_labels {
                return Err(UpstreamApiError::message("add labels rejected"));
            }
            self.label_calls.lock().unwrap().push(labels.to_vec());
            Ok(())
        }

        async fn request_reviewers(
            &self,
            _pr: PrNumber,
            reviewers: &[String],
        ) -> Result<(), UpstreamApiError> {
            self.reviewer_calls.lock().unwrap().push(reviewers.to_vec());
            Ok(())
        }

        async fn collaborator_permission(
            &self,
            user: &str,
        ) -> Result<PermissionLevel, UpstreamApiError> {
            if self.fail_permission {
                return Err(UpstreamApiError::message("permission check rejected"));
            }
            Ok(self
                .permissions
                .get(user)
                .copied()
                .unwrap_or(PermissionLevel::None))
        }

        async fn add_collaborator(
            &self,
            _user: &str,
            _permission: PermissionLevel,
        ) -> Result<(), UpstreamApiError> {
            Ok(())
        }

        async fn post_comment(&self, _pr: PrNumber, body: &str) -> Result<(), UpstreamApiError> {
            self.comments.lock().unwrap().push(body.to_string());
            Ok(())
        }
    }

    /// In-memory maintainer table.
    struct TableLookup(BTreeMap<String, BTreeSet<String>>);

    impl TableLookup {
        fn new(pairs: &[(&str, &[&str])]) -> Self {
            TableLookup(
                pairs
                    .iter()
                    .map(|(pkg, users)| {
                        (
                            pkg.to_string(),
                            users.iter().map(|u| u.to_string()).collect(),
                        )
                    })
                    .collect(),
            )
        }
    }

    impl MaintainerLookup for TableLookup {
        async fn resolve_maintainers(
            &self,
            package: &str,
        ) -> Result<BTreeSet<String>, WorkspaceError> {
            Ok(self.0.get(package).cloned().unwrap_or_default())
        }
    }

    fn package_file(name: &str) -> ChangeSetEntry {
        ChangeSetEntry {
            filename: format!("var/spack/repos/builtin/packages/{name}/package.py"),
            status: FileStatus::Modified,
            patch: None,
        }
    }

    #[tokio::test]
    async fn label_pipeline_submits_one_batched_call() {
        let api = FakeApi::with_files(vec![
            ChangeSetEntry {
                filename: "var/spack/repos/builtin/packages/foo/package.py".into(),
                status: FileStatus::Added,
                patch: Some("@@ -0,0 +1,1 @@\n+    version(\"1.0\")".into()),
            },
            ChangeSetEntry {
                filename: "lib/spack/docs/index.rst".into(),
                status: FileStatus::Modified,
                patch: None,
            },
        ]);

        let labels = run_label_pipeline(&api, PrNumber(3)).await.unwrap();

        assert!(labels.contains("new-package"));
        assert!(labels.contains("new-version"));
        assert!(labels.contains("documentation"));

        let calls = api.label_calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].len(), labels.len());
    }

    #[tokio::test]
    async fn label_pipeline_skips_submission_when_nothing_matched() {
        let api = FakeApi::with_files(vec![ChangeSetEntry {
            filename: "var/spack/repos/builtin/packages/foo/README".into(),
            status: FileStatus::Added,
            patch: None,
        }]);

        let labels = run_label_pipeline(&api, PrNumber(3)).await.unwrap();

        assert!(labels.is_empty());
        assert!(api.label_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn label_failure_does_not_block_reviewer_pipeline() {
        let mut api = FakeApi::with_files(vec![package_file("zlib")])
            .permission("bob", PermissionLevel::Write);
        api.fail_add_labels = true;
        let lookup = TableLookup::new(&[("zlib", &["bob"])]);

        let result = run_pipelines(
            &api,
            Some(&lookup),
            PrNumber(9),
            "alice",
            &[TriagePipeline::Labels, TriagePipeline::Reviewers],
        )
        .await;

        // labels failed and contributed nothing
        assert!(result.labels.is_empty());
        assert!(api.label_calls.lock().unwrap().is_empty());

        // but reviewer assignment still ran
        assert_eq!(result.assignment.direct, vec!["bob"]);
        assert_eq!(
            *api.reviewer_calls.lock().unwrap(),
            vec![vec!["bob".to_string()]]
        );
    }

    #[tokio::test]
    async fn reviewer_failure_still_reports_label_outcome() {
        let mut api = FakeApi::with_files(vec![package_file("zlib")]);
        api.fail_permission = true;
        let lookup = TableLookup::new(&[("zlib", &["bob"])]);

        let result = run_pipelines(
            &api,
            Some(&lookup),
            PrNumber(9),
            "alice",
            &[TriagePipeline::Labels, TriagePipeline::Reviewers],
        )
        .await;

        // labels ran and were submitted before the reviewer pipeline failed
        assert!(result.labels.contains("update-package"));
        assert_eq!(api.label_calls.lock().unwrap().len(), 1);

        // reviewer failure left the assignment empty, no panic, no bubble
        assert_eq!(result.assignment, reviewers::ReviewerAssignment::default());
    }

    #[tokio::test]
    async fn missing_lookup_skips_reviewers_but_runs_labels() {
        let api = FakeApi::with_files(vec![package_file("zlib")]);

        let result = run_pipelines(
            &api,
            None::<&TableLookup>,
            PrNumber(9),
            "alice",
            &[TriagePipeline::Labels, TriagePipeline::Reviewers],
        )
        .await;

        assert!(result.labels.contains("update-package"));
        assert!(result.resolution.is_empty());
        assert!(api.reviewer_calls.lock().unwrap().is_empty());
        assert!(api.comments.lock().unwrap().is_empty());
    }
}
