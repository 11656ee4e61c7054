//! Cursor-based pagination over Bitbucket listings.
//!
//! Bitbucket wraps collections in a page envelope whose optional `next`
//! field holds the absolute URL of the following page. Pages are fetched
//! strictly one after another; the walk ends when a page has no `next`.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::client::BitbucketClient;
use crate::error::{Error, Result};

/// One page of a paginated Bitbucket collection.
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    /// Records on this page.
    #[serde(default = "Vec::new")]
    pub values: Vec<T>,
    /// Absolute URL of the next page, absent on the last page.
    #[serde(default)]
    pub next: Option<String>,
    /// 1-based page number, when the service reports it.
    #[serde(default)]
    pub page: Option<u32>,
    /// Requested page length.
    #[serde(default)]
    pub pagelen: Option<u32>,
    /// Total number of records across all pages, when known.
    #[serde(default)]
    pub size: Option<u64>,
}

impl BitbucketClient {
    /// Fetches a single page.
    pub(crate) async fn fetch_page<T: DeserializeOwned>(&self, url: &str) -> Result<Page<T>> {
        self.get_json(url).await
    }

    /// Walks every page starting at `first_url`, converting each record with
    /// `convert` and preserving page and in-page order.
    ///
    /// The first conversion error aborts the walk; nothing collected so far
    /// is returned. When the client has a page limit and another page is
    /// still announced after reaching it, the walk fails with
    /// [`Error::PageLimit`].
    pub(crate) async fn collect_pages<T, U, F>(
        &self,
        first_url: String,
        mut convert: F,
    ) -> Result<Vec<U>>
    where
        T: DeserializeOwned,
        F: FnMut(T) -> Result<U>,
    {
        let mut items = Vec::new();
        let mut cursor = Some(first_url);
        let mut fetched: u32 = 0;

        while let Some(url) = cursor {
            if let Some(max_pages) = self.max_pages.filter(|max| fetched >= *max) {
                return Err(Error::PageLimit { max_pages });
            }

            let page: Page<T> = self.fetch_page(&url).await?;
            fetched += 1;
            debug!(
                page = fetched,
                records = page.values.len(),
                has_next = page.next.is_some(),
                "fetched page"
            );

            for value in page.values {
                items.push(convert(value)?);
            }
            cursor = page.next;
        }

        Ok(items)
    }
}
