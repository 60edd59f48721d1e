//! Wire types shared between the GitHub client and the review state machine.
//!
//! Inbound webhook payloads are deserialized into the subset of fields the
//! workflow actually reads; outbound response shapes mirror the REST API
//! fields we consume.

use serde::Deserialize;

/// One changed file of a pull request, as returned by
/// `GET /repos/{owner}/{repo}/pulls/{number}/files`.
///
/// `patch` is absent for binary files and for files GitHub refuses to diff.
#[derive(Debug, Clone, Deserialize)]
pub struct PrFile {
    pub filename: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub additions: u64,
    #[serde(default)]
    pub deletions: u64,
    #[serde(default)]
    pub patch: Option<String>,
}

fn default_status() -> String {
    "modified".to_string()
}

/// Created issue comment (subset).
#[derive(Debug, Clone, Deserialize)]
pub struct PostedComment {
    pub id: u64,
}

/// Commit status states accepted by `POST /repos/{owner}/{repo}/statuses/{sha}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusState {
    Pending,
    Success,
    Failure,
    Error,
}

impl StatusState {
    pub fn as_str(self) -> &'static str {
        match self {
            StatusState::Pending => "pending",
            StatusState::Success => "success",
            StatusState::Failure => "failure",
            StatusState::Error => "error",
        }
    }
}

// --- Webhook payload shapes (subset of fields we actually use) ---

/// `pull_request` webhook event.
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestEvent {
    pub action: String,
    pub pull_request: PullRequestInfo,
    pub repository: Repository,
    pub installation: Installation,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestInfo {
    pub number: u64,
    #[serde(default)]
    pub draft: bool,
    pub head: HeadRef,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HeadRef {
    pub sha: String,
}

/// `issue_comment` webhook event.
#[derive(Debug, Clone, Deserialize)]
pub struct IssueCommentEvent {
    pub action: String,
    pub comment: CommentInfo,
    pub issue: IssueInfo,
    pub repository: Repository,
    pub installation: Installation,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentInfo {
    pub user: UserInfo,
    pub body: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserInfo {
    pub login: String,
    /// "User" or "Bot".
    #[serde(rename = "type", default)]
    pub kind: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IssueInfo {
    pub number: u64,
    /// Present only when the issue is a pull request.
    #[serde(default)]
    pub pull_request: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    pub name: String,
    pub owner: Owner,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Owner {
    pub login: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Installation {
    pub id: u64,
}

impl Repository {
    /// Composite review key: `owner/repo#number`.
    pub fn pr_id(&self, number: u64) -> String {
        format!("{}/{}#{}", self.owner.login, self.name, number)
    }
}
