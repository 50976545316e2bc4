//! GitHub webhook payload parser.
//!
//! Parses raw webhook JSON into a typed [`PullRequestEvent`]. The parser is
//! deliberately tolerant of unknown event types (they return `Ok(None)`, not
//! an error) and strict about the fields triage actually needs: a
//! `pull_request` payload missing `installation.id` or the author login is
//! malformed and rejected before any authenticated work happens.

use serde::Deserialize;
use thiserror::Error;

use crate::types::{InstallationId, PrNumber, RepoId};

use super::events::{PrAction, PullRequestEvent};

/// Error type for webhook parsing failures.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON deserialization failed (includes missing required fields).
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The payload parsed but lacks a field triage cannot proceed without.
    #[error("payload missing required field: {0}")]
    MissingField(&'static str),
}

// ============================================================================
// Raw payload structures for deserialization
//
// These match GitHub's webhook JSON. Fields that may legitimately be absent
// are Option<T>; required fields are validated explicitly afterwards.
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawPayload {
    action: PrAction,
    pull_request: RawPullRequest,
    repository: RawRepository,
    installation: Option<RawInstallation>,
}

#[derive(Debug, Deserialize)]
struct RawPullRequest {
    number: u64,
    user: RawUser,
    head: Option<RawRef>,
}

#[derive(Debug, Deserialize)]
struct RawUser {
    login: String,
}

#[derive(Debug, Deserialize)]
struct RawRef {
    #[serde(rename = "ref")]
    git_ref: String,
}

#[derive(Debug, Deserialize)]
struct RawRepository {
    name: String,
    owner: RawUser,
}

#[derive(Debug, Deserialize)]
struct RawInstallation {
    id: u64,
}

/// Parses a webhook payload into a typed event.
///
/// # Returns
///
/// * `Ok(Some(event))` — a `pull_request` event the router can dispatch
/// * `Ok(None)` — any other event type (ignored, not an error)
/// * `Err(e)` — malformed payload or missing required fields
pub fn parse_webhook(
    event_type: &str,
    payload: &[u8],
) -> Result<Option<PullRequestEvent>, ParseError> {
    if event_type != "pull_request" {
        return Ok(None);
    }

    let raw: RawPayload = serde_json::from_slice(payload)?;

    let installation = raw
        .installation
        .ok_or(ParseError::MissingField("installation.id"))?;

    Ok(Some(PullRequestEvent {
        repo: RepoId::new(raw.repository.owner.login, raw.repository.name),
        action: raw.action,
        number: PrNumber(raw.pull_request.number),
        author: raw.pull_request.user.login,
        head_ref: raw
            .pull_request
            .head
            .map(|h| h.git_ref)
            .unwrap_or_default(),
        installation: InstallationId(installation.id),
    }))
}
