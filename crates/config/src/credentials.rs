//! Bitbucket credential storage.
//!
//! Credentials are a username plus an app password, persisted as a single
//! JSON document:
//!
//! ```json
//! {
//!   "username": "jdoe",
//!   "appPassword": "ATBB..."
//! }
//! ```
//!
//! A missing file is not an error: it loads as empty credentials so that
//! callers can prompt for them and [`save`](Credentials::save) the result.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::persistence::{read_config_file, write_config_file};

/// A Bitbucket username and app password.
///
/// The `Debug` implementation redacts the app password.
///
/// # Examples
///
/// ```
/// use bbpr_config::Credentials;
///
/// let creds = Credentials::new("jdoe", "secret");
/// assert!(creds.is_complete());
/// assert!(!format!("{creds:?}").contains("secret"));
///
/// assert!(!Credentials::default().is_complete());
/// ```
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    /// The Bitbucket account username.
    #[serde(default, deserialize_with = "any_as_string")]
    pub username: String,

    /// An app password scoped to the API operations in use.
    #[serde(default, deserialize_with = "any_as_string")]
    pub app_password: String,
}

/// Accepts any JSON value for a credential field. Strings are taken as-is,
/// `null` becomes empty and anything else is kept in its JSON text form.
fn any_as_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

impl Credentials {
    /// Creates credentials from a username and app password.
    #[must_use]
    pub fn new(username: impl Into<String>, app_password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            app_password: app_password.into(),
        }
    }

    /// Loads credentials from `path`.
    ///
    /// Returns empty credentials when the file does not exist. Fields missing
    /// from the document default to empty strings. Field shapes are not
    /// validated: a number such as `{"username": 123}` loads as `"123"`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    ///
    /// # Examples
    ///
    /// ```
    /// use bbpr_config::Credentials;
    ///
    /// let creds = Credentials::load("/nonexistent/credentials.json").unwrap();
    /// assert_eq!(creds, Credentials::default());
    /// ```
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        read_config_file(path)
    }

    /// Saves the credentials to `path` as pretty-printed JSON, overwriting
    /// any existing file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        write_config_file(path, self)
    }

    /// Returns whether both the username and the app password are present.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.username.is_empty() && !self.app_password.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("app_password", &"[REDACTED]")
            .finish()
    }
}
