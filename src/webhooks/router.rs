//! Event routing: which triage pipelines run for a given event.
//!
//! The mapping is fixed:
//!
//! | Event + action | Pipelines |
//! |---|---|
//! | `pull_request` + `opened` | labels, then reviewers |
//! | `pull_request` + `synchronize` | labels only |
//! | anything else | none (explicitly allowed, not an error) |
//!
//! Labeling always runs before maintainer resolution when both apply, but
//! the pipelines are independent: a failure in one must not prevent the
//! other from running. That isolation lives in the worker, which runs each
//! pipeline and logs its failure separately; this module only decides *what*
//! runs, as a pure function that tests can exercise exhaustively.

use super::events::{PrAction, PullRequestEvent};

/// A triage pipeline the bot can run for one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriagePipeline {
    /// Classify changed files and add labels to the PR.
    Labels,
    /// Resolve package maintainers and request reviews.
    Reviewers,
}

/// Returns the pipelines to run for an event, in execution order.
pub fn pipelines_for(event: &PullRequestEvent) -> Vec<TriagePipeline> {
    match event.action {
        PrAction::Opened => vec![TriagePipeline::Labels, TriagePipeline::Reviewers],
        PrAction::Synchronize => vec![TriagePipeline::Labels],
        _ => vec![],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{InstallationId, PrNumber, RepoId};

    fn event(action: PrAction) -> PullRequestEvent {
        PullRequestEvent {
            repo: RepoId::new("spack", "spack"),
            action,
            number: PrNumber(7),
            author: "alice".into(),
            head_ref: "feature".into(),
            installation: InstallationId(1),
        }
    }

    #[test]
    fn opened_runs_labels_then_reviewers() {
        assert_eq!(
            pipelines_for(&event(PrAction::Opened)),
            vec![TriagePipeline::Labels, TriagePipeline::Reviewers]
        );
    }

    #[test]
    fn synchronize_runs_labels_only() {
        assert_eq!(
            pipelines_for(&event(PrAction::Synchronize)),
            vec![TriagePipeline::Labels]
        );
    }

    #[test]
    fn other_actions_are_no_ops() {
        for action in [
            PrAction::Closed,
            PrAction::Edited,
            PrAction::Reopened,
            PrAction::Other,
        ] {
            assert!(pipelines_for(&event(action)).is_empty());
        }
    }
}
