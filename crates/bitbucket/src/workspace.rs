//! Workspace discovery.
//!
//! Workspaces are derived from the repositories the user is a member of.
//! Only the first page of that listing is read, so workspaces whose
//! repositories appear only on later pages are not reported.

use std::collections::BTreeSet;

use tracing::{debug, instrument};

use crate::client::BitbucketClient;
use crate::error::{Error, Result};
use crate::pagination::Page;
use crate::repository::{MEMBER_REPOSITORIES_PATH, RawRepository};

/// Returns the workspace identifier of a raw repository record.
///
/// Prefers the embedded `workspace.slug`, then the owner's username.
#[must_use]
pub fn workspace_slug(repo: &RawRepository) -> Option<&str> {
    repo.workspace_ref
        .as_ref()
        .and_then(|w| w.slug.as_deref())
        .or(repo.owner.username.as_deref())
}

/// Reduces records to their distinct workspace identifiers.
///
/// Records without any workspace identifier are skipped.
#[must_use]
pub fn distinct_workspaces<'a>(
    repos: impl IntoIterator<Item = &'a RawRepository>,
) -> BTreeSet<String> {
    repos
        .into_iter()
        .filter_map(workspace_slug)
        .map(str::to_string)
        .collect()
}

impl BitbucketClient {
    /// Fetches the workspaces of the user's repositories.
    ///
    /// Reads the first page of member repositories only. Records are not
    /// required to carry an `https` clone link.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FetchWorkspaces`] if the request fails.
    #[instrument(skip(self), fields(username = %self.username()))]
    pub async fn fetch_workspaces(&self) -> Result<BTreeSet<String>> {
        let url = self.endpoint(MEMBER_REPOSITORIES_PATH);
        let page: Page<RawRepository> = self
            .fetch_page(&url)
            .await
            .map_err(|e| Error::FetchWorkspaces(Box::new(e)))?;

        let workspaces = distinct_workspaces(&page.values);
        debug!(
            records = page.values.len(),
            workspaces = workspaces.len(),
            "derived workspaces from first page"
        );
        Ok(workspaces)
    }
}
