//! Bitbucket Cloud API client for bbpr.
//!
//! This crate wraps the handful of Bitbucket REST endpoints bbpr needs:
//! repository and workspace listing, pull request listing and actions,
//! branch lookups, plus cloning through the `git` command.
//!
//! # Overview
//!
//! - [`BitbucketClient`]: Authenticated HTTP client, one per set of credentials
//! - [`Repository`]: Repository record with derived display name, workspace
//!   and clone URL
//! - [`PullRequest`] and [`NewPullRequest`]: Pull request records and the
//!   creation payload
//! - [`GitCloner`]: Runs `git clone`
//! - [`Error`]: Error types for API operations
//!
//! # Failure Reporting
//!
//! Every operation returns a [`Result`]; the crate never prints. Errors are
//! shaped so that callers can report them verbatim:
//!
//! - Queries wrap their cause with a prefix such as `Error fetching PRs: `.
//! - Actions (approve, unapprove, decline, merge, create) return
//!   [`Error::Action`], displayed as `Failed to approve PR: ...`.
//! - [`BitbucketClient::branch_exists`] folds every failure into `false`.
//!
//! # Examples
//!
//! ```no_run
//! use bbpr_bitbucket::{BitbucketClient, NewPullRequest};
//! use bbpr_config::{ClientSettings, Credentials};
//!
//! # async fn example() -> bbpr_bitbucket::Result<()> {
//! let creds = Credentials::new("jdoe", "app-password");
//! let client = BitbucketClient::new(&creds, &ClientSettings::default())?;
//!
//! for pr in client.fetch_open_pull_requests("acme", "widgets").await? {
//!     println!("#{} {}", pr.id, pr.title);
//! }
//!
//! if client.branch_exists("acme/widgets", "feature/login").await {
//!     let pr = NewPullRequest::new("Add login", "feature/login", "main");
//!     client.create_pull_request("acme", "widgets", &pr).await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod branch;
pub mod client;
pub mod clone;
pub mod error;
pub mod pagination;
pub mod pull_request;
pub mod repository;
pub mod workspace;

pub use client::BitbucketClient;
pub use clone::GitCloner;
pub use error::{Error, PullRequestAction, Result};
pub use pagination::Page;
pub use pull_request::{NewPullRequest, PullRequest, strip_git_suffix};
pub use repository::Repository;
