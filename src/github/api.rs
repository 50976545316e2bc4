//! The GitHub capability trait used by the triage pipelines.
//!
//! Every REST call the engine makes goes through [`GithubApi`], so the
//! pipelines can be tested against an in-memory implementation without
//! touching the network. The production implementation is
//! [`super::OctocrabClient`].

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::triage::changes::ChangeSetEntry;
use crate::types::PrNumber;

use super::error::UpstreamApiError;

/// Repository-scoped collaborator permission level.
///
/// Computed from the collaborator-permission endpoint, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionLevel {
    /// Not a collaborator.
    None,
    /// Read access.
    Read,
    /// Write access.
    Write,
    /// Admin access.
    Admin,
}

impl PermissionLevel {
    /// Whether a user at this level can be requested as a PR reviewer.
    pub fn can_review(&self) -> bool {
        matches!(self, PermissionLevel::Write | PermissionLevel::Admin)
    }
}

/// GitHub REST operations consumed by the triage engine.
///
/// Implementations are scoped to a single repository; operations take only
/// the PR number or user login. All failures are [`UpstreamApiError`] and
/// are never retried at this layer.
pub trait GithubApi: Send + Sync {
    /// Lists the files changed by a pull request, in API order.
    ///
    /// The order is not guaranteed stable across calls; callers must not
    /// depend on it for correctness.
    fn list_pull_request_files(
        &self,
        pr: PrNumber,
    ) -> impl Future<Output = Result<Vec<ChangeSetEntry>, UpstreamApiError>> + Send;

    /// Adds labels to the PR's issue. Adding an already-present label is a
    /// no-op on GitHub's side.
    fn add_labels(
        &self,
        pr: PrNumber,
        labels: &[String],
    ) -> impl Future<Output = Result<(), UpstreamApiError>> + Send;

    /// Requests reviews from the given users in one call.
    ///
    /// GitHub caps the number of reviewers per call; callers exceeding the
    /// cap must chunk (see [`crate::triage::reviewers`]), not rely on this
    /// method to split.
    fn request_reviewers(
        &self,
        pr: PrNumber,
        reviewers: &[String],
    ) -> impl Future<Output = Result<(), UpstreamApiError>> + Send;

    /// Returns the user's permission level on the repository.
    ///
    /// Users who are not collaborators at all are `PermissionLevel::None`
    /// (GitHub's permission endpoint reports `read` for anyone on a public
    /// repo, so implementations must check collaborator membership first).
    fn collaborator_permission(
        &self,
        user: &str,
    ) -> impl Future<Output = Result<PermissionLevel, UpstreamApiError>> + Send;

    /// Grants the user collaborator access at the given level.
    fn add_collaborator(
        &self,
        user: &str,
        permission: PermissionLevel,
    ) -> impl Future<Output = Result<(), UpstreamApiError>> + Send;

    /// Posts a comment on the PR's conversation thread.
    fn post_comment(
        &self,
        pr: PrNumber,
        body: &str,
    ) -> impl Future<Output = Result<(), UpstreamApiError>> + Send;
}
