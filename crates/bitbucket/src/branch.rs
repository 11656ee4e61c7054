//! Branch existence checks.

use tracing::{debug, instrument};

use crate::client::BitbucketClient;

impl BitbucketClient {
    /// Returns whether `branch` exists in the repository at `repo_path`
    /// (`"{workspace}/{repo_slug}"`).
    ///
    /// Any failure reports `false`: a missing branch, a missing repository,
    /// an authentication problem and a network error all look the same to
    /// the caller. The cause is logged at debug level.
    #[instrument(skip(self))]
    pub async fn branch_exists(&self, repo_path: &str, branch: &str) -> bool {
        let url = self.endpoint(&format!("repositories/{repo_path}/refs/branches/{branch}"));
        match self.get(&url).await {
            Ok(_) => true,
            Err(e) => {
                debug!(error = %e, "branch lookup failed");
                false
            }
        }
    }
}
