//! Repository listing and derived repository fields.
//!
//! Raw repository records are kept mostly opaque: only the fields needed to
//! compute the display name, workspace and clone URL are typed, everything
//! else is carried through untouched.
//!
//! # Derived Fields
//!
//! | Field | Source |
//! |-------|--------|
//! | `nameWithWorkspace` | `"{owner.display_name} / {name}"` |
//! | `workspace` | `owner.username`, else `workspace.slug` |
//! | `cloneUrl` | `href` of the first `links.clone` entry named `https` |

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, instrument, warn};

use crate::client::BitbucketClient;
use crate::error::{Error, Result};

/// Endpoint listing repositories the authenticated user is a member of.
pub(crate) const MEMBER_REPOSITORIES_PATH: &str = "repositories?role=member";

/// Name of the clone link used for [`Repository::clone_url`].
const HTTPS_CLONE_LINK: &str = "https";

/// A repository record as returned by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRepository {
    /// Repository name.
    #[serde(default)]
    pub name: String,

    /// `"{workspace}/{slug}"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,

    /// URL-safe repository identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,

    /// The owning account or team.
    #[serde(default)]
    pub owner: Owner,

    /// Related links, including clone URLs.
    #[serde(default)]
    pub links: RepositoryLinks,

    /// The workspace the repository lives in. Replaced by the derived
    /// `workspace` string when a [`Repository`] is serialized.
    #[serde(default, rename = "workspace", skip_serializing)]
    pub workspace_ref: Option<WorkspaceRef>,

    /// All remaining fields, untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RawRepository {
    /// Returns the most specific identifier available for messages.
    #[must_use]
    pub fn identifier(&self) -> &str {
        self.full_name.as_deref().unwrap_or(&self.name)
    }

    /// Returns the `href` of the `https` clone link, if present.
    #[must_use]
    pub fn https_clone_link(&self) -> Option<&str> {
        self.links
            .clone
            .iter()
            .find(|link| link.name == HTTPS_CLONE_LINK)
            .map(|link| link.href.as_str())
    }
}

/// Owner of a repository.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Owner {
    /// Human-readable name.
    #[serde(default)]
    pub display_name: String,

    /// Short account name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Links attached to a repository.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepositoryLinks {
    /// Protocol-tagged clone URLs.
    #[serde(default)]
    pub clone: Vec<CloneLink>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A clone URL tagged with its protocol (`https`, `ssh`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloneLink {
    /// Protocol tag.
    pub name: String,
    /// Clone URL.
    pub href: String,
}

/// Reference to a workspace embedded in a repository record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceRef {
    /// Workspace identifier.
    #[serde(default)]
    pub slug: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A repository with its derived fields.
///
/// Serializes as the raw record plus `nameWithWorkspace`, `workspace` and
/// `cloneUrl`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Repository {
    /// The record as received.
    #[serde(flatten)]
    pub raw: RawRepository,

    /// `"{owner display name} / {repository name}"`.
    pub name_with_workspace: String,

    /// Short name of the owning workspace.
    pub workspace: String,

    /// HTTPS clone URL.
    pub clone_url: String,
}

impl Repository {
    /// Derives the computed fields from a raw record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingCloneLink`] when the record has no clone link
    /// named `https`.
    ///
    /// # Examples
    ///
    /// ```
    /// use bbpr_bitbucket::repository::{RawRepository, Repository};
    ///
    /// let raw: RawRepository = serde_json::from_value(serde_json::json!({
    ///     "name": "widgets",
    ///     "owner": { "display_name": "Acme", "username": "acme" },
    ///     "links": { "clone": [
    ///         { "name": "https", "href": "https://bb.org/acme/widgets.git" }
    ///     ] }
    /// })).unwrap();
    ///
    /// let repo = Repository::from_raw(raw).unwrap();
    /// assert_eq!(repo.name_with_workspace, "Acme / widgets");
    /// assert_eq!(repo.workspace, "acme");
    /// assert_eq!(repo.clone_url, "https://bb.org/acme/widgets.git");
    /// ```
    pub fn from_raw(raw: RawRepository) -> Result<Self> {
        let clone_url = raw
            .https_clone_link()
            .ok_or_else(|| Error::MissingCloneLink {
                repository: raw.identifier().to_string(),
            })?
            .to_string();

        let workspace = raw
            .owner
            .username
            .clone()
            .or_else(|| raw.workspace_ref.as_ref().and_then(|w| w.slug.clone()))
            .unwrap_or_default();

        Ok(Self {
            name_with_workspace: format!("{} / {}", raw.owner.display_name, raw.name),
            workspace,
            clone_url,
            raw,
        })
    }

    /// Returns the repository slug, falling back to the name.
    #[must_use]
    pub fn slug(&self) -> &str {
        self.raw.slug.as_deref().unwrap_or(&self.raw.name)
    }

    /// Returns whether `query` names this repository by full name, display
    /// name with workspace, or slug.
    #[must_use]
    pub fn matches(&self, query: &str) -> bool {
        self.raw.full_name.as_deref() == Some(query)
            || self.name_with_workspace == query
            || self.slug() == query
    }
}

impl BitbucketClient {
    /// Fetches every repository the authenticated user is a member of.
    ///
    /// Follows `next` links until the last page, deriving
    /// [`Repository`] fields for every record in order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FetchRepositories`] wrapping the first failure: a
    /// request error, or a record without an `https` clone link. A failure on
    /// any page discards the records gathered so far.
    #[instrument(skip(self), fields(username = %self.username()))]
    pub async fn fetch_repositories(&self) -> Result<Vec<Repository>> {
        let first = self.endpoint(MEMBER_REPOSITORIES_PATH);
        match self.collect_pages(first, Repository::from_raw).await {
            Ok(repositories) => {
                debug!(count = repositories.len(), "fetched repositories");
                Ok(repositories)
            }
            Err(e) => {
                warn!(error = %e, "repository listing failed");
                Err(Error::FetchRepositories(Box::new(e)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawRepository {
        serde_json::from_value(value).unwrap()
    }

    fn widgets() -> Value {
        json!({
            "name": "widgets",
            "full_name": "acme/widgets",
            "slug": "widgets",
            "is_private": true,
            "owner": { "display_name": "Acme", "username": "acme", "type": "team" },
            "workspace": { "slug": "acme-ws", "type": "workspace" },
            "links": {
                "html": { "href": "https://bitbucket.org/acme/widgets" },
                "clone": [
                    { "name": "ssh", "href": "git@bitbucket.org:acme/widgets.git" },
                    { "name": "https", "href": "https://bb.org/acme/widgets.git" }
                ]
            }
        })
    }

    #[test]
    fn derives_computed_fields() {
        let repo = Repository::from_raw(raw(widgets())).unwrap();
        assert_eq!(repo.name_with_workspace, "Acme / widgets");
        assert_eq!(repo.workspace, "acme");
        assert_eq!(repo.clone_url, "https://bb.org/acme/widgets.git");
    }

    #[test]
    fn workspace_falls_back_to_workspace_slug() {
        let mut value = widgets();
        value["owner"] = json!({ "display_name": "Acme" });
        let repo = Repository::from_raw(raw(value)).unwrap();
        assert_eq!(repo.workspace, "acme-ws");
    }

    #[test]
    fn missing_https_link_fails() {
        let mut value = widgets();
        value["links"]["clone"] =
            json!([{ "name": "ssh", "href": "git@bitbucket.org:acme/widgets.git" }]);
        let err = Repository::from_raw(raw(value)).unwrap_err();
        match err {
            Error::MissingCloneLink { repository } => assert_eq!(repository, "acme/widgets"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn first_https_link_wins() {
        let mut value = widgets();
        value["links"]["clone"] = json!([
            { "name": "https", "href": "https://first.example/w.git" },
            { "name": "https", "href": "https://second.example/w.git" }
        ]);
        let repo = Repository::from_raw(raw(value)).unwrap();
        assert_eq!(repo.clone_url, "https://first.example/w.git");
    }

    #[test]
    fn serializes_remote_fields_with_derived_ones() {
        let repo = Repository::from_raw(raw(widgets())).unwrap();
        let value = serde_json::to_value(&repo).unwrap();

        assert_eq!(value["is_private"], true);
        assert_eq!(value["links"]["html"]["href"], "https://bitbucket.org/acme/widgets");
        assert_eq!(value["nameWithWorkspace"], "Acme / widgets");
        assert_eq!(value["workspace"], "acme");
        assert_eq!(value["cloneUrl"], "https://bb.org/acme/widgets.git");
    }

    #[test]
    fn matches_by_any_name() {
        let repo = Repository::from_raw(raw(widgets())).unwrap();
        assert!(repo.matches("acme/widgets"));
        assert!(repo.matches("Acme / widgets"));
        assert!(repo.matches("widgets"));
        assert!(!repo.matches("gadgets"));
    }
}
