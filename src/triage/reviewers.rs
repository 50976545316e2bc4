//! Reviewer assignment from a maintainer resolution.
//!
//! Maintainers with `write` or `admin` access can be requested as reviewers
//! directly. Everyone else first gets `write` collaborator access and is
//! then pinged in a single comment. Packages with no maintainers at all
//! produce one separate comment asking the PR author to find volunteers.
//!
//! GitHub caps review requests at 15 reviewers per call; larger direct
//! groups are chunked across calls rather than truncated.

use tracing::{debug, info};

use crate::github::{GithubApi, PermissionLevel, UpstreamApiError};
use crate::types::PrNumber;

use super::comments::{no_maintainers_comment, reviewer_ping_comment};
use super::maintainers::MaintainerResolution;

/// GitHub's limit on reviewers in one review-request call.
pub const MAX_REVIEWERS_PER_REQUEST: usize = 15;

/// What the assigner did, for logging and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewerAssignment {
    /// Maintainers requested as reviewers directly.
    pub direct: Vec<String>,

    /// Maintainers granted collaborator access and pinged by comment.
    pub invited: Vec<String>,
}

/// Requests reviews and posts maintainer comments for one resolution.
///
/// Posts at most two comments: one for packages without maintainers and one
/// pinging invited maintainers. Each is composed once for the whole batch.
pub async fn assign_reviewers<A: GithubApi>(
    api: &A,
    pr: PrNumber,
    author: &str,
    resolution: &MaintainerResolution,
) -> Result<ReviewerAssignment, UpstreamApiError> {
    // Packages nobody maintains: ask the author to find volunteers.
    if !resolution.unmaintained.is_empty() {
        info!(
            pr = %pr,
            packages = resolution.unmaintained.len(),
            "requesting maintainers for unmaintained packages"
        );
        api.post_comment(pr, &no_maintainers_comment(author, &resolution.unmaintained))
            .await?;
    }

    if resolution.maintainers.is_empty() {
        return Ok(ReviewerAssignment::default());
    }

    // Partition by repository permission.
    let mut assignment = ReviewerAssignment::default();
    for user in &resolution.maintainers {
        let permission = api.collaborator_permission(user).await?;
        debug!(user = %user, ?permission, "maintainer permission");

        if permission.can_review() {
            assignment.direct.push(user.clone());
        } else {
            assignment.invited.push(user.clone());
        }
    }

    if !assignment.direct.is_empty() {
        info!(pr = %pr, reviewers = ?assignment.direct, "requesting reviews");
        for chunk in assignment.direct.chunks(MAX_REVIEWERS_PER_REQUEST) {
            api.request_reviewers(pr, chunk).await?;
        }
    }

    if !assignment.invited.is_empty() {
        info!(pr = %pr, invited = ?assignment.invited, "inviting maintainers as collaborators");
        for user in &assignment.invited {
            api.add_collaborator(user, PermissionLevel::Write).await?;
        }

        api.post_comment(
            pr,
            &reviewer_ping_comment(&assignment.invited, &resolution.maintained),
        )
        .await?;
    }

    Ok(assignment)
}
