//! GitHub API access for the triage engine.
//!
//! The [`GithubApi`] trait is the seam between triage logic and the REST
//! API; [`OctocrabClient`] is the production implementation, scoped to one
//! repository and authenticated with a per-event installation token.

pub mod api;
mod client;
mod error;

pub use api::{GithubApi, PermissionLevel};
pub use client::OctocrabClient;
pub use error::UpstreamApiError;
