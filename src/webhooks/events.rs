//! Typed GitHub webhook events.
//!
//! The bot only acts on `pull_request` events; everything else is ignored at
//! the parsing layer. The typed event carries exactly the fields triage
//! needs: who opened the PR (so maintainer resolution can exclude them),
//! where it lives, and which installation to authenticate as.

use serde::{Deserialize, Serialize};

use crate::types::{InstallationId, PrNumber, RepoId};

/// Action performed on a pull request.
///
/// Only `opened` and `synchronize` trigger triage; the rest are parsed so
/// routing can decide explicitly (and tests can assert the no-op cases).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrAction {
    /// PR was opened.
    Opened,
    /// PR head was updated (new commits pushed).
    Synchronize,
    /// PR was closed (merged or not).
    Closed,
    /// PR was edited (title, body, or base branch changed).
    Edited,
    /// PR was reopened.
    Reopened,
    /// Any other action GitHub may deliver.
    #[serde(other)]
    Other,
}

/// A pull request webhook event, reduced to the fields triage consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestEvent {
    /// The repository the PR targets.
    pub repo: RepoId,

    /// The action that triggered this event.
    pub action: PrAction,

    /// The PR number.
    pub number: PrNumber,

    /// The PR author's login. Maintainer resolution never pings the author.
    pub author: String,

    /// The head ref of the PR branch (used for logging only; maintainer
    /// lookups always run against the trusted upstream default branch).
    pub head_ref: String,

    /// The App installation this event was delivered for.
    pub installation: InstallationId,
}
