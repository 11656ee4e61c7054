//! HTTP client settings.
//!
//! This module provides [`ClientSettings`], which controls where API requests
//! are sent and the optional safety limits applied to them.
//!
//! # Defaults
//!
//! - Base URL: `https://api.bitbucket.org/2.0`
//! - Timeout: none (a stalled request waits indefinitely)
//! - Page limit: none (pagination follows `next` links until the service
//!   stops sending them)
//!
//! # Environment
//!
//! [`ClientSettings::from_env`] reads `BBPR_API_URL`, `BBPR_TIMEOUT_SECS` and
//! `BBPR_MAX_PAGES`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Default Bitbucket Cloud API root.
pub const DEFAULT_API_BASE_URL: &str = "https://api.bitbucket.org/2.0";

/// Environment variable overriding the API root.
pub const API_URL_ENV: &str = "BBPR_API_URL";

/// Environment variable setting the request timeout in seconds.
pub const TIMEOUT_ENV: &str = "BBPR_TIMEOUT_SECS";

/// Environment variable capping the number of pages fetched per listing.
pub const MAX_PAGES_ENV: &str = "BBPR_MAX_PAGES";

/// Settings for the Bitbucket HTTP client.
///
/// # Examples
///
/// ```
/// use bbpr_config::ClientSettings;
///
/// let settings = ClientSettings::default();
/// assert_eq!(settings.api_base_url, "https://api.bitbucket.org/2.0");
/// assert!(settings.timeout().is_none());
/// assert!(settings.max_pages.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSettings {
    /// Root URL that endpoint paths are appended to.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Per-request timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    /// Maximum number of pages a paginated listing may fetch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_pages: Option<u32>,
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            timeout_secs: None,
            max_pages: None,
        }
    }
}

impl ClientSettings {
    /// Creates settings pointing at a different API root, e.g. a mock server.
    #[must_use]
    pub fn with_base_url(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            ..Self::default()
        }
    }

    /// Builds settings from the defaults overlaid with `BBPR_*` environment
    /// variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidSetting`] if a numeric variable does not
    /// parse or the resulting settings fail [`validate`](Self::validate).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through `lookup`.
    ///
    /// Blank values are treated as unset.
    ///
    /// # Errors
    ///
    /// Same as [`from_env`](Self::from_env).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut settings = Self::default();

        if let Some(url) = lookup(API_URL_ENV).filter(|v| !v.trim().is_empty()) {
            settings.api_base_url = url.trim().to_string();
        }
        if let Some(raw) = lookup(TIMEOUT_ENV).filter(|v| !v.trim().is_empty()) {
            settings.timeout_secs = Some(parse_number(TIMEOUT_ENV, &raw)?);
        }
        if let Some(raw) = lookup(MAX_PAGES_ENV).filter(|v| !v.trim().is_empty()) {
            settings.max_pages = Some(parse_number(MAX_PAGES_ENV, &raw)?);
        }

        settings.validate()?;
        Ok(settings)
    }

    /// Returns the request timeout, if one is configured.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Returns the base URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.api_base_url.trim_end_matches('/')
    }

    /// Validates the settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is empty, or if the timeout or page
    /// limit is set to zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use bbpr_config::ClientSettings;
    ///
    /// let mut settings = ClientSettings::default();
    /// assert!(settings.validate().is_ok());
    ///
    /// settings.max_pages = Some(0);
    /// assert!(settings.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<()> {
        if self.base_url().is_empty() {
            return Err(ConfigError::InvalidSetting {
                name: "api_base_url",
                reason: "must not be empty".to_string(),
            });
        }
        if self.timeout_secs == Some(0) {
            return Err(ConfigError::InvalidSetting {
                name: "timeout_secs",
                reason: "must be at least 1 second".to_string(),
            });
        }
        if self.max_pages == Some(0) {
            return Err(ConfigError::InvalidSetting {
                name: "max_pages",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(name: &'static str, raw: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidSetting {
            name,
            reason: format!("{raw:?} is not a valid number: {e}"),
        })
}
