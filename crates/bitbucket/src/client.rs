//! Bitbucket API client implementation.
//!
//! This module provides the [`BitbucketClient`] struct, which owns the HTTP
//! client and the credentials every request is authenticated with.

use bbpr_config::{ClientSettings, Credentials};
use reqwest::{Method, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use url::Url;

use crate::error::{Error, Result};

/// Bitbucket Cloud API client.
///
/// Every request carries HTTP Basic authentication built from the username
/// and app password the client was created with. Endpoint paths are
/// interpolated verbatim: workspace names, repository slugs and branch names
/// are neither validated nor escaped.
///
/// # Security
///
/// The app password is stored as a [`SecretString`] and never appears in
/// `Debug` output or logs.
///
/// # Examples
///
/// ```no_run
/// use bbpr_bitbucket::BitbucketClient;
/// use bbpr_config::{ClientSettings, Credentials};
///
/// # async fn example() -> bbpr_bitbucket::Result<()> {
/// let creds = Credentials::new("jdoe", "app-password");
/// let client = BitbucketClient::new(&creds, &ClientSettings::default())?;
///
/// for repo in client.fetch_repositories().await? {
///     println!("{} -> {}", repo.name_with_workspace, repo.clone_url);
/// }
/// # Ok(())
/// # }
/// ```
pub struct BitbucketClient {
    http: reqwest::Client,
    base_url: String,
    username: String,
    app_password: SecretString,
    pub(crate) max_pages: Option<u32>,
}

impl BitbucketClient {
    /// Creates a new client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBaseUrl`] if the configured API root does not
    /// parse, or [`Error::Http`] if the HTTP client cannot be built.
    #[instrument(
        skip_all,
        fields(username = %credentials.username, base_url = %settings.base_url())
    )]
    pub fn new(credentials: &Credentials, settings: &ClientSettings) -> Result<Self> {
        let base_url = settings.base_url().to_string();
        Url::parse(&base_url).map_err(|source| Error::InvalidBaseUrl {
            url: base_url.clone(),
            source,
        })?;

        let mut builder =
            reqwest::Client::builder().user_agent(concat!("bbpr/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = settings.timeout() {
            debug!(?timeout, "applying request timeout");
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            base_url,
            username: credentials.username.clone(),
            app_password: SecretString::from(credentials.app_password.clone()),
            max_pages: settings.max_pages,
        })
    }

    /// Returns the username requests are authenticated as.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns the API root, without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Builds an absolute URL for a path relative to the API root.
    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.http
            .request(method, url)
            .basic_auth(&self.username, Some(self.app_password.expose_secret()))
    }

    /// Sends an authenticated `GET`, failing on non-success statuses.
    pub(crate) async fn get(&self, url: &str) -> Result<Response> {
        send(self.request(Method::GET, url)).await
    }

    /// Sends an authenticated `GET` and decodes the JSON body.
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        Ok(self.get(url).await?.json().await?)
    }

    /// Sends an authenticated `POST` with a JSON body.
    pub(crate) async fn post<B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<Response> {
        send(self.request(Method::POST, url).json(body)).await
    }

    /// Sends an authenticated `DELETE` without a body.
    pub(crate) async fn delete(&self, url: &str) -> Result<Response> {
        send(self.request(Method::DELETE, url)).await
    }
}

impl std::fmt::Debug for BitbucketClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BitbucketClient")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("max_pages", &self.max_pages)
            .finish_non_exhaustive()
    }
}

/// Shape of Bitbucket error bodies: `{"type": "error", "error": {"message": ...}}`.
#[derive(Deserialize)]
struct ErrorBody {
    error: Option<ErrorDetail>,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: Option<String>,
}

async fn send(request: RequestBuilder) -> Result<Response> {
    let response = request.send().await?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().to_string();
    let message = response
        .json::<ErrorBody>()
        .await
        .ok()
        .and_then(|body| body.error)
        .and_then(|detail| detail.message);
    warn!(%status, %url, message = ?message, "request failed");

    Err(Error::Status {
        status,
        url,
        message,
    })
}
