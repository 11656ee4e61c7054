//! Pull request listing and actions.
//!
//! Listing open pull requests is a query: failures are returned as
//! [`Error::FetchPullRequests`]. Approve, unapprove, decline, merge and
//! create are actions: failures are returned as [`Error::Action`] so the
//! caller can report them without aborting.
//!
//! # Endpoints
//!
//! | Operation | Request |
//! |-----------|---------|
//! | open pull requests | `GET repositories/{workspace}/{repo}/pullrequests?state=OPEN` |
//! | create | `POST repositories/{workspace}/{repo}/pullrequests` |
//! | approve | `POST repositories/{workspace}/{repo}/pullrequests/{id}/approve` |
//! | unapprove | `DELETE repositories/{workspace}/{repo}/pullrequests/{id}/approve` |
//! | decline | `POST repositories/{workspace}/{repo}/pullrequests/{id}/decline` |
//! | merge | `POST repositories/{workspace}/{repo}/pullrequests/{id}/merge` |

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::{debug, instrument};

use crate::client::BitbucketClient;
use crate::error::{Error, PullRequestAction, Result};
use crate::pagination::Page;

/// A pull request as returned by the service.
///
/// Only identifiers, branches and links are typed; the rest of the record is
/// kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PullRequest {
    /// Numeric identifier, unique within the repository.
    pub id: u64,

    /// Title.
    #[serde(default)]
    pub title: String,

    /// `OPEN`, `MERGED`, `DECLINED` or `SUPERSEDED`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    /// Branch the changes come from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<BranchEndpoint>,

    /// Branch the changes go into.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<BranchEndpoint>,

    /// Who opened the pull request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<Author>,

    /// Related links.
    #[serde(default)]
    pub links: PullRequestLinks,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PullRequest {
    /// Returns the web URL of the pull request, if the service sent one.
    #[must_use]
    pub fn html_url(&self) -> Option<&str> {
        self.links.html.as_ref().map(|link| link.href.as_str())
    }

    /// Returns the source branch name.
    #[must_use]
    pub fn source_branch(&self) -> Option<&str> {
        self.source.as_ref().map(|s| s.branch.name.as_str())
    }

    /// Returns the destination branch name.
    #[must_use]
    pub fn destination_branch(&self) -> Option<&str> {
        self.destination.as_ref().map(|d| d.branch.name.as_str())
    }
}

/// One side of a pull request: `{"branch": {"name": ...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchEndpoint {
    /// The branch.
    pub branch: BranchName,
}

impl BranchEndpoint {
    /// Creates an endpoint for the named branch.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            branch: BranchName { name: name.into() },
        }
    }
}

/// A branch reference by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchName {
    /// Branch name.
    pub name: String,
}

/// Pull request author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    /// Human-readable name.
    #[serde(default)]
    pub display_name: String,
}

/// Links attached to a pull request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestLinks {
    /// Web page of the pull request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<Link>,
}

/// A hyperlink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Target URL.
    pub href: String,
}

/// Request body for opening a pull request.
///
/// # Examples
///
/// ```
/// use bbpr_bitbucket::NewPullRequest;
///
/// let pr = NewPullRequest::new("Add widgets", "feature/widgets", "main");
/// let body = serde_json::to_value(&pr).unwrap();
/// assert_eq!(body["source"]["branch"]["name"], "feature/widgets");
/// assert_eq!(body["destination"]["branch"]["name"], "main");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewPullRequest {
    /// Title.
    pub title: String,
    /// Branch the changes come from.
    pub source: BranchEndpoint,
    /// Branch the changes go into.
    pub destination: BranchEndpoint,
}

impl NewPullRequest {
    /// Creates a request body from a title and branch names.
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        source_branch: impl Into<String>,
        destination_branch: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            source: BranchEndpoint::new(source_branch),
            destination: BranchEndpoint::new(destination_branch),
        }
    }
}

/// Removes the first `.git` occurrence from a repository slug, so that a
/// name copied from a clone URL can be used directly.
///
/// [`BitbucketClient::create_pull_request`] applies this to its slug.
#[must_use]
pub fn strip_git_suffix(repo_slug: &str) -> String {
    repo_slug.replacen(".git", "", 1)
}

impl BitbucketClient {
    fn pull_requests_url(&self, workspace: &str, repo_slug: &str) -> String {
        self.endpoint(&format!("repositories/{workspace}/{repo_slug}/pullrequests"))
    }

    fn pull_request_url(&self, workspace: &str, repo_slug: &str, id: u64, action: &str) -> String {
        format!("{}/{id}/{action}", self.pull_requests_url(workspace, repo_slug))
    }

    /// Fetches the open pull requests of a repository.
    ///
    /// Only the first page is read.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FetchPullRequests`] if the request fails.
    #[instrument(skip(self))]
    pub async fn fetch_open_pull_requests(
        &self,
        workspace: &str,
        repo_slug: &str,
    ) -> Result<Vec<PullRequest>> {
        let url = format!("{}?state=OPEN", self.pull_requests_url(workspace, repo_slug));
        let page: Page<PullRequest> = self
            .fetch_page(&url)
            .await
            .map_err(|e| Error::FetchPullRequests(Box::new(e)))?;
        debug!(count = page.values.len(), "fetched open pull requests");
        Ok(page.values)
    }

    /// Approves a pull request as the authenticated user.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Action`] if the request fails.
    #[instrument(skip(self))]
    pub async fn approve_pull_request(
        &self,
        workspace: &str,
        repo_slug: &str,
        id: u64,
    ) -> Result<()> {
        let url = self.pull_request_url(workspace, repo_slug, id, "approve");
        self.post(&url, &json!({}))
            .await
            .map(drop)
            .map_err(|e| Error::action(PullRequestAction::Approve, e))
    }

    /// Withdraws the authenticated user's approval.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Action`] if the request fails.
    #[instrument(skip(self))]
    pub async fn unapprove_pull_request(
        &self,
        workspace: &str,
        repo_slug: &str,
        id: u64,
    ) -> Result<()> {
        let url = self.pull_request_url(workspace, repo_slug, id, "approve");
        self.delete(&url)
            .await
            .map(drop)
            .map_err(|e| Error::action(PullRequestAction::Unapprove, e))
    }

    /// Declines a pull request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Action`] if the request fails.
    #[instrument(skip(self))]
    pub async fn decline_pull_request(
        &self,
        workspace: &str,
        repo_slug: &str,
        id: u64,
    ) -> Result<()> {
        let url = self.pull_request_url(workspace, repo_slug, id, "decline");
        self.post(&url, &json!({}))
            .await
            .map(drop)
            .map_err(|e| Error::action(PullRequestAction::Decline, e))
    }

    /// Merges a pull request with the repository's default strategy.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Action`] if the request fails.
    #[instrument(skip(self))]
    pub async fn merge_pull_request(
        &self,
        workspace: &str,
        repo_slug: &str,
        id: u64,
    ) -> Result<()> {
        let url = self.pull_request_url(workspace, repo_slug, id, "merge");
        self.post(&url, &json!({}))
            .await
            .map(drop)
            .map_err(|e| Error::action(PullRequestAction::Merge, e))
    }

    /// Opens a pull request.
    ///
    /// A `.git` suffix copied from a clone URL is removed from `repo_slug`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Action`] if the request fails or the response cannot
    /// be decoded. A common cause is a source branch that was never pushed.
    #[instrument(skip(self, pull_request), fields(title = %pull_request.title))]
    pub async fn create_pull_request(
        &self,
        workspace: &str,
        repo_slug: &str,
        pull_request: &NewPullRequest,
    ) -> Result<PullRequest> {
        let url = self.pull_requests_url(workspace, &strip_git_suffix(repo_slug));
        let created = async {
            let response = self.post(&url, pull_request).await?;
            Ok::<PullRequest, Error>(response.json().await?)
        }
        .await
        .map_err(|e| Error::action(PullRequestAction::Create, e))?;

        debug!(id = created.id, "created pull request");
        Ok(created)
    }
}
