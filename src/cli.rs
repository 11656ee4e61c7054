//! Command-line interface definition.

use std::path::PathBuf;

use bbpr_config::settings::{API_URL_ENV, MAX_PAGES_ENV, TIMEOUT_ENV};
use bbpr_config::{ClientSettings, Result};
use clap::{Args, Parser, Subcommand};

/// Work with Bitbucket Cloud repositories and pull requests.
#[derive(Debug, Parser)]
#[command(name = "bbpr", author, version, about, long_about = None)]
pub struct Cli {
    /// Credentials file [default: $BBPR_CONFIG, then ~/.config/bbpr/credentials.json]
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// API root URL [env: BBPR_API_URL]
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Per-request timeout in seconds [env: BBPR_TIMEOUT_SECS]
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Maximum pages fetched when listing repositories [env: BBPR_MAX_PAGES]
    #[arg(long, global = true, value_name = "N")]
    pub max_pages: Option<u32>,

    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Prompt for a username and app password and save them
    Login,

    /// List repositories you are a member of
    Repos {
        /// Print full repository records as JSON
        #[arg(long)]
        json: bool,
    },

    /// List workspaces of your repositories
    Workspaces,

    /// List open pull requests of a repository
    Prs {
        /// Workspace slug
        workspace: String,
        /// Repository slug
        repo: String,
    },

    /// Approve a pull request
    Approve(PullRequestArgs),

    /// Withdraw your approval of a pull request
    Unapprove(PullRequestArgs),

    /// Decline a pull request
    Decline(PullRequestArgs),

    /// Merge a pull request
    Merge(PullRequestArgs),

    /// Open a pull request
    Create {
        /// Workspace slug
        workspace: String,
        /// Repository slug
        repo: String,
        /// Pull request title
        #[arg(short, long)]
        title: String,
        /// Branch with the changes
        #[arg(short, long)]
        source: String,
        /// Branch to merge into
        #[arg(short, long, default_value = "main")]
        destination: String,
    },

    /// Check whether a branch exists on the remote
    BranchExists {
        /// Repository as `workspace/repo`
        repo_path: String,
        /// Branch name
        branch: String,
    },

    /// Clone a repository by URL or name
    Clone {
        /// An https clone URL, or a full name (`workspace/repo`), display name
        /// or slug of one of your repositories
        target: String,
    },
}

/// Identifies a pull request.
#[derive(Debug, Args)]
pub struct PullRequestArgs {
    /// Workspace slug
    pub workspace: String,
    /// Repository slug
    pub repo: String,
    /// Pull request number
    pub id: u64,
}

impl Cli {
    /// Builds client settings from the environment, overridden by flags.
    pub fn client_settings(&self) -> Result<ClientSettings> {
        self.client_settings_with(|name| std::env::var(name).ok())
    }

    /// A flag replaces its environment variable before anything is parsed,
    /// so a malformed variable is ignored when the flag is given.
    fn client_settings_with(
        &self,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<ClientSettings> {
        ClientSettings::from_lookup(|name| {
            let flag = match name {
                API_URL_ENV => self.api_url.clone(),
                TIMEOUT_ENV => self.timeout.map(|t| t.to_string()),
                MAX_PAGES_ENV => self.max_pages.map(|m| m.to_string()),
                _ => None,
            };
            flag.or_else(|| env(name))
        })
    }
}
