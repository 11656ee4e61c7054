//! Configuration management for bbpr.
//!
//! This crate handles the locally persisted Bitbucket credentials and the
//! settings used to build the HTTP client.
//!
//! # Overview
//!
//! - [`credentials`]: Username and app password, loaded from and saved to JSON
//! - [`persistence`]: Credentials path resolution and JSON file I/O
//! - [`settings`]: API root, timeout and pagination limits
//! - [`error`]: Error types for configuration operations
//!
//! # Credentials Location
//!
//! The credentials file is resolved with the following priority:
//!
//! 1. `--config <path>` command-line flag
//! 2. `BBPR_CONFIG` environment variable
//! 3. `~/.config/bbpr/credentials.json`
//!
//! # Examples
//!
//! ```no_run
//! use bbpr_config::{Credentials, persistence::resolve_credentials_path};
//!
//! # fn example() -> bbpr_config::Result<()> {
//! let path = resolve_credentials_path(None)?;
//! let mut creds = Credentials::load(&path)?;
//! if !creds.is_complete() {
//!     creds = Credentials::new("jdoe", "app-password");
//!     creds.save(&path)?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod credentials;
pub mod error;
pub mod persistence;
pub mod settings;

pub use credentials::Credentials;
pub use error::{ConfigError, Result};
pub use settings::ClientSettings;
