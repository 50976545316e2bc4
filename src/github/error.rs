//! GitHub API error type.
//!
//! Any REST call failure is an [`UpstreamApiError`]. The triage engine never
//! retries these: an error aborts the affected pipeline only, not the whole
//! event. Retry policy, if any, belongs to the HTTP-calling collaborator.
//!
//! A 404 on a collaborator check means "this user has no access" — an
//! answer, not a failure — and the client maps it before an error is ever
//! constructed.

use std::fmt;
use thiserror::Error;

/// A GitHub REST API failure.
#[derive(Debug, Error)]
pub struct UpstreamApiError {
    /// The HTTP status code, if one was received.
    pub status_code: Option<u16>,

    /// A human-readable description of the failed operation.
    pub message: String,

    /// The underlying octocrab error, if available.
    #[source]
    pub source: Option<octocrab::Error>,
}

impl fmt::Display for UpstreamApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status_code {
            Some(code) => write!(f, "GitHub API error (HTTP {}): {}", code, self.message),
            None => write!(f, "GitHub API error: {}", self.message),
        }
    }
}

impl UpstreamApiError {
    /// Wraps an octocrab error with operation context.
    pub fn from_octocrab(message: impl Into<String>, err: octocrab::Error) -> Self {
        Self {
            status_code: extract_status_code(&err),
            message: message.into(),
            source: Some(err),
        }
    }

    /// Creates an error without an underlying octocrab source.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            status_code: None,
            message: message.into(),
            source: None,
        }
    }
}

/// Extracts the HTTP status code from an octocrab error, if present.
fn extract_status_code(err: &octocrab::Error) -> Option<u16> {
    if let octocrab::Error::GitHub { source, .. } = err {
        return Some(source.status_code.as_u16());
    }
    None
}
