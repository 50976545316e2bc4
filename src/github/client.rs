//! Octocrab-backed implementation of the triage API, scoped to one repository.
//!
//! The client wraps an `Octocrab` instance authenticated with an
//! installation token and scopes every operation to a single repository,
//! matching the capability trait (operations carry only PR numbers and user
//! logins).

use octocrab::Octocrab;
use serde::{Deserialize, Serialize};

use crate::triage::changes::ChangeSetEntry;
use crate::types::{PrNumber, RepoId};

use super::api::{GithubApi, PermissionLevel};
use super::error::UpstreamApiError;

/// A GitHub API client scoped to a specific repository.
#[derive(Clone)]
pub struct OctocrabClient {
    /// The underlying octocrab client.
    client: Octocrab,

    /// The repository this client is scoped to.
    repo: RepoId,
}

impl OctocrabClient {
    /// Creates a new client scoped to the given repository.
    ///
    /// The `Octocrab` instance must already be authenticated (the worker
    /// builds one per event from an installation token).
    pub fn new(client: Octocrab, repo: RepoId) -> Self {
        Self { client, repo }
    }

    /// Creates a client from an installation token.
    ///
    /// `api_timeout` bounds each request; a wedged GitHub call must not pin
    /// the worker for longer than one configuration-chosen interval.
    pub fn from_token(
        token: impl Into<String>,
        repo: RepoId,
        api_timeout: std::time::Duration,
    ) -> Result<Self, octocrab::Error> {
        let client = Octocrab::builder()
            .personal_token(token.into())
            .set_connect_timeout(Some(api_timeout))
            .set_read_timeout(Some(api_timeout))
            .build()?;
        Ok(Self::new(client, repo))
    }

    fn owner(&self) -> &str {
        &self.repo.owner
    }

    fn repo_name(&self) -> &str {
        &self.repo.repo
    }
}

impl std::fmt::Debug for OctocrabClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OctocrabClient")
            .field("repo", &self.repo)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize)]
struct AddLabelsRequest<'a> {
    labels: &'a [String],
}

#[derive(Debug, Serialize)]
struct RequestReviewersRequest<'a> {
    reviewers: &'a [String],
}

#[derive(Debug, Serialize)]
struct AddCollaboratorRequest {
    permission: &'static str,
}

#[derive(Debug, Deserialize)]
struct PermissionResponse {
    permission: PermissionLevel,
}

impl GithubApi for OctocrabClient {
    async fn list_pull_request_files(
        &self,
        pr: PrNumber,
    ) -> Result<Vec<ChangeSetEntry>, UpstreamApiError> {
        let mut files = Vec::new();
        let mut page = 1u32;

        loop {
            let url = format!(
                "/repos/{}/{}/pulls/{}/files?per_page=100&page={}",
                self.owner(),
                self.repo_name(),
                pr.0,
                page
            );

            let batch: Vec<ChangeSetEntry> = self
                .client
                .get(&url, None::<&()>)
                .await
                .map_err(|e| UpstreamApiError::from_octocrab("list pull request files", e))?;

            let is_last_page = batch.len() < 100;
            files.extend(batch);

            if is_last_page {
                break;
            }
            page += 1;
        }

        Ok(files)
    }

    async fn add_labels(&self, pr: PrNumber, labels: &[String]) -> Result<(), UpstreamApiError> {
        let url = format!(
            "/repos/{}/{}/issues/{}/labels",
            self.owner(),
            self.repo_name(),
            pr.0
        );

        let _: serde_json::Value = self
            .client
            .post(&url, Some(&AddLabelsRequest { labels }))
            .await
            .map_err(|e| UpstreamApiError::from_octocrab("add labels", e))?;

        Ok(())
    }

    async fn request_reviewers(
        &self,
        pr: PrNumber,
        reviewers: &[String],
    ) -> Result<(), UpstreamApiError> {
        let url = format!(
            "/repos/{}/{}/pulls/{}/requested_reviewers",
            self.owner(),
            self.repo_name(),
            pr.0
        );

        let _: serde_json::Value = self
            .client
            .post(&url, Some(&RequestReviewersRequest { reviewers }))
            .await
            .map_err(|e| UpstreamApiError::from_octocrab("request reviewers", e))?;

        Ok(())
    }

    async fn collaborator_permission(
        &self,
        user: &str,
    ) -> Result<PermissionLevel, UpstreamApiError> {
        // The permission endpoint reports "read" for pretty much anyone on a
        // public repo, so membership has to be checked first: GET on the
        // collaborator URL returns 204 for collaborators, 404 otherwise.
        let membership_url = format!(
            "/repos/{}/{}/collaborators/{}",
            self.owner(),
            self.repo_name(),
            user
        );

        let response = self
            .client
            ._get(membership_url)
            .await
            .map_err(|e| UpstreamApiError::from_octocrab("collaborator check", e))?;

        match response.status().as_u16() {
            204 => {}
            404 => return Ok(PermissionLevel::None),
            code => {
                return Err(UpstreamApiError {
                    status_code: Some(code),
                    message: format!("collaborator check for {user}"),
                    source: None,
                })
            }
        }

        let permission_url = format!(
            "/repos/{}/{}/collaborators/{}/permission",
            self.owner(),
            self.repo_name(),
            user
        );

        let response: PermissionResponse = self
            .client
            .get(&permission_url, None::<&()>)
            .await
            .map_err(|e| UpstreamApiError::from_octocrab("collaborator permission", e))?;

        Ok(response.permission)
    }

    async fn add_collaborator(
        &self,
        user: &str,
        permission: PermissionLevel,
    ) -> Result<(), UpstreamApiError> {
        let url = format!(
            "/repos/{}/{}/collaborators/{}",
            self.owner(),
            self.repo_name(),
            user
        );

        // The REST API uses git-flavored permission names on this endpoint.
        let permission = match permission {
            PermissionLevel::Read => "pull",
            PermissionLevel::Write => "push",
            PermissionLevel::Admin => "admin",
            PermissionLevel::None => {
                return Err(UpstreamApiError::message(
                    "cannot add a collaborator with no permission",
                ))
            }
        };

        // 201 returns the invitation, 204 means already a collaborator;
        // both are success and neither body is interesting here.
        let response = self
            .client
            ._put(url, Some(&AddCollaboratorRequest { permission }))
            .await
            .map_err(|e| UpstreamApiError::from_octocrab("add collaborator", e))?;

        if !response.status().is_success() {
            return Err(UpstreamApiError {
                status_code: Some(response.status().as_u16()),
                message: format!("add collaborator {user}"),
                source: None,
            });
        }

        Ok(())
    }

    async fn post_comment(&self, pr: PrNumber, body: &str) -> Result<(), UpstreamApiError> {
        self.client
            .issues(self.owner(), self.repo_name())
            .create_comment(pr.0, body)
            .await
            .map_err(|e| UpstreamApiError::from_octocrab("post comment", e))?;

        Ok(())
    }
}
