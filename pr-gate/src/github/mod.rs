//! GitHub REST client for the PR-review workflow.
//!
//! Endpoints used (api version 2022-11-28):
//! - GET  /repos/{owner}/{repo}/pulls/{number}/files   (paginated, "patch" is unified diff)
//! - POST /repos/{owner}/{repo}/issues/{number}/comments
//! - POST /repos/{owner}/{repo}/statuses/{sha}

pub mod types;
pub use types::*;

use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use crate::errors::{GateResult, ProviderError};

/// Fixed context label for the comprehension-check commit status.
pub const STATUS_CONTEXT: &str = "PR-Comprehension-Check";

/// Commit-status descriptions are capped by GitHub at 140 characters.
const MAX_STATUS_DESCRIPTION: usize = 140;

/// Page size for the changed-files listing.
const FILES_PER_PAGE: usize = 100;

#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: Client,
    base_api: String, // e.g. "https://api.github.com"
    token: String,    // installation access token
}

impl GitHubClient {
    /// Constructs a GitHub client with a shared reqwest instance and an
    /// installation token obtained from the credential cache.
    pub fn new(http: Client, base_api: String, token: String) -> Self {
        Self {
            http,
            base_api,
            token,
        }
    }

    /// Fetches the list of changed files for a PR (includes patch diffs).
    ///
    /// Follows pagination until a short page is returned.
    pub async fn list_pr_files(
        &self,
        owner: &str,
        repo: &str,
        pr_number: u64,
    ) -> GateResult<Vec<PrFile>> {
        let url = format!(
            "{}/repos/{}/{}/pulls/{}/files",
            self.base_api, owner, repo, pr_number
        );

        let mut files = Vec::new();
        let mut page = 1u32;
        loop {
            debug!("GET {} page={}", url, page);
            let resp = self
                .http
                .get(&url)
                .query(&[("per_page", FILES_PER_PAGE as u32), ("page", page)])
                .bearer_auth(&self.token)
                .header("Accept", "application/vnd.github+json")
                .header("X-GitHub-Api-Version", "2022-11-28")
                .send()
                .await?;

            let batch: Vec<PrFile> = check_status(resp).await?.json().await?;
            let len = batch.len();
            files.extend(batch);

            if len < FILES_PER_PAGE {
                break;
            }
            page += 1;
        }

        Ok(files)
    }

    /// Posts a comment on a PR. Returns the created comment reference.
    pub async fn post_issue_comment(
        &self,
        owner: &str,
        repo: &str,
        pr_number: u64,
        body: &str,
    ) -> GateResult<PostedComment> {
        #[derive(Serialize)]
        struct Req<'a> {
            body: &'a str,
        }

        let url = format!(
            "{}/repos/{}/{}/issues/{}/comments",
            self.base_api, owner, repo, pr_number
        );
        debug!("POST {}", url);
        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
            .json(&Req { body })
            .send()
            .await?;

        let comment: PostedComment = check_status(resp).await?.json().await?;
        Ok(comment)
    }

    /// Sets a commit status check against a specific SHA.
    ///
    /// The description is truncated to the provider's 140-character cap.
    pub async fn set_commit_status(
        &self,
        owner: &str,
        repo: &str,
        sha: &str,
        state: StatusState,
        description: &str,
    ) -> GateResult<()> {
        #[derive(Serialize)]
        struct Req<'a> {
            state: &'a str,
            context: &'a str,
            description: &'a str,
        }

        let description: String = description.chars().take(MAX_STATUS_DESCRIPTION).collect();

        let url = format!("{}/repos/{}/{}/statuses/{}", self.base_api, owner, repo, sha);
        debug!("POST {} state={}", url, state.as_str());
        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
            .json(&Req {
                state: state.as_str(),
                context: STATUS_CONTEXT,
                description: &description,
            })
            .send()
            .await?;

        check_status(resp).await?;
        Ok(())
    }
}

/// Maps non-success statuses to [`ProviderError`] before body decoding.
async fn check_status(resp: reqwest::Response) -> GateResult<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let code = status.as_u16();
    Err(match code {
        401 => ProviderError::Unauthorized,
        403 => ProviderError::Forbidden,
        404 => ProviderError::NotFound,
        429 => ProviderError::RateLimited {
            retry_after_secs: None,
        },
        500..=599 => ProviderError::Server(code),
        _ => ProviderError::HttpStatus(code),
    }
    .into())
}
