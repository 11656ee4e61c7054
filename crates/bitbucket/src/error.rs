//! Error types for Bitbucket API operations.
//!
//! Errors fall in two groups. Request-level errors ([`Error::Http`],
//! [`Error::Status`], ...) describe what went wrong on the wire. Operation
//! errors wrap them with a message naming the operation that failed, e.g.
//! `Error fetching PRs: ...` or `Failed to approve PR: ...`.

use std::fmt;

use reqwest::StatusCode;

/// Errors that can occur during Bitbucket API operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The request could not be sent or its response could not be read.
    #[error("{0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status code.
    #[error("request to {url} failed with status {status}{}", format_message(.message.as_deref()))]
    Status {
        /// The HTTP status returned.
        status: StatusCode,
        /// The URL that was requested.
        url: String,
        /// The error message from the response body, if any.
        message: Option<String>,
    },

    /// The configured API root is not a valid URL.
    #[error("invalid API base URL {url:?}: {source}")]
    InvalidBaseUrl {
        /// The rejected URL.
        url: String,
        /// The parse failure.
        #[source]
        source: url::ParseError,
    },

    /// A repository record has no clone link tagged `https`.
    #[error("repository {repository} has no https clone link")]
    MissingCloneLink {
        /// Full name (or name) of the offending repository.
        repository: String,
    },

    /// A paginated listing had more pages than the configured limit.
    #[error("more results remain after {max_pages} pages")]
    PageLimit {
        /// The configured page limit.
        max_pages: u32,
    },

    /// Listing repositories failed.
    #[error("Error fetching repositories: {0}")]
    FetchRepositories(#[source] Box<Error>),

    /// Listing workspaces failed.
    #[error("Error fetching workspaces: {0}")]
    FetchWorkspaces(#[source] Box<Error>),

    /// Listing open pull requests failed.
    #[error("Error fetching PRs: {0}")]
    FetchPullRequests(#[source] Box<Error>),

    /// A pull-request action failed.
    #[error("Failed to {action}: {source}")]
    Action {
        /// The action that was attempted.
        action: PullRequestAction,
        /// Why it failed.
        #[source]
        source: Box<Error>,
    },

    /// The version-control program could not be started.
    #[error("failed to run {program}: {source}")]
    CloneSpawn {
        /// The program that was invoked.
        program: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The clone command exited unsuccessfully.
    #[error("clone command exited with {}", format_exit_code(*.code))]
    CloneFailed {
        /// The exit code, if the process was not killed by a signal.
        code: Option<i32>,
    },
}

impl Error {
    /// Wraps `source` as a failure of the given pull-request action.
    #[must_use]
    pub fn action(action: PullRequestAction, source: Error) -> Self {
        Self::Action {
            action,
            source: Box::new(source),
        }
    }

    /// Returns the HTTP status behind this error, looking through operation
    /// wrappers.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Http(e) => e.status(),
            Self::FetchRepositories(inner)
            | Self::FetchWorkspaces(inner)
            | Self::FetchPullRequests(inner)
            | Self::Action { source: inner, .. } => inner.status(),
            _ => None,
        }
    }
}

/// Pull-request operations that report failure instead of propagating it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullRequestAction {
    /// Add the caller's approval.
    Approve,
    /// Withdraw the caller's approval.
    Unapprove,
    /// Decline the pull request.
    Decline,
    /// Merge the pull request.
    Merge,
    /// Open a new pull request.
    Create,
}

impl PullRequestAction {
    /// Returns the confirmation printed after the action succeeds.
    #[must_use]
    pub fn success_message(self) -> &'static str {
        match self {
            Self::Approve => "Pull request approved.",
            Self::Unapprove => "Pull request unapproved.",
            Self::Decline => "Pull request declined.",
            Self::Merge => "Pull request merged.",
            Self::Create => "Pull request created.",
        }
    }
}

impl fmt::Display for PullRequestAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Approve => "approve PR",
            Self::Unapprove => "unapprove PR",
            Self::Decline => "decline PR",
            Self::Merge => "merge PR",
            Self::Create => "create pull request",
        })
    }
}

fn format_message(message: Option<&str>) -> String {
    match message {
        Some(message) => format!(": {message}"),
        None => String::new(),
    }
}

fn format_exit_code(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

/// A specialized Result type for Bitbucket API operations.
pub type Result<T> = std::result::Result<T, Error>;
