//! Command handlers.
//!
//! Handlers decide what a failure means for the process. Listing
//! repositories and every pull-request action report their failure on
//! stderr and still succeed; listing workspaces and pull requests propagate
//! the error.

use std::io::{self, BufRead, Write};
use std::path::Path;

use anyhow::{Context, bail};
use bbpr_bitbucket::{
    BitbucketClient, GitCloner, NewPullRequest, PullRequestAction, strip_git_suffix,
};
use bbpr_config::Credentials;
use tracing::{debug, info};

use crate::cli::{Command, PullRequestArgs};

/// Hint printed after a failed pull request creation.
const PUSH_HINT: &str = "Did you push the branch before trying to create the PR?";

/// Output streams for user-facing messages.
pub struct Console<O, E> {
    pub out: O,
    pub err: E,
}

impl Console<io::Stdout, io::Stderr> {
    /// Returns a console writing to the process's stdout and stderr.
    pub fn stdio() -> Self {
        Self {
            out: io::stdout(),
            err: io::stderr(),
        }
    }
}

/// Prompts for credentials on `input` and saves them to `path`.
pub fn login<O: Write, E: Write>(
    path: &Path,
    input: &mut impl BufRead,
    console: &mut Console<O, E>,
) -> anyhow::Result<Credentials> {
    let username = prompt(input, console, "Bitbucket username: ")?;
    let app_password = prompt(input, console, "App password: ")?;
    if username.is_empty() || app_password.is_empty() {
        bail!("username and app password are both required");
    }

    let credentials = Credentials::new(username, app_password);
    credentials
        .save(path)
        .with_context(|| format!("saving credentials to {}", path.display()))?;
    info!(path = %path.display(), "saved credentials");
    writeln!(console.out, "Credentials saved to {}", path.display())?;
    Ok(credentials)
}

/// Loads the stored credentials, prompting for them on `input` and saving
/// them when the stored ones are incomplete.
pub fn credentials_or_login<O: Write, E: Write>(
    path: &Path,
    input: &mut impl BufRead,
    console: &mut Console<O, E>,
) -> anyhow::Result<Credentials> {
    let credentials = Credentials::load(path)
        .with_context(|| format!("loading credentials from {}", path.display()))?;
    if credentials.is_complete() {
        return Ok(credentials);
    }
    debug!(path = %path.display(), "no stored credentials, prompting");
    writeln!(console.err, "No credentials stored in {}.", path.display())?;
    login(path, input, console)
}

fn prompt<O: Write, E: Write>(
    input: &mut impl BufRead,
    console: &mut Console<O, E>,
    label: &str,
) -> anyhow::Result<String> {
    write!(console.out, "{label}")?;
    console.out.flush()?;
    let mut line = String::new();
    input.read_line(&mut line).context("reading from stdin")?;
    Ok(line.trim().to_string())
}

/// Runs a command that needs an authenticated client.
pub async fn run<O: Write, E: Write>(
    client: &BitbucketClient,
    cloner: &GitCloner,
    command: Command,
    console: &mut Console<O, E>,
) -> anyhow::Result<()> {
    match command {
        Command::Login => bail!("login does not use the API client"),
        Command::Repos { json } => list_repositories(client, json, console).await,
        Command::Workspaces => list_workspaces(client, console).await,
        Command::Prs { workspace, repo } => {
            list_pull_requests(client, &workspace, &repo, console).await
        }
        Command::Approve(PullRequestArgs { workspace, repo, id }) => {
            let result = client.approve_pull_request(&workspace, &repo, id).await;
            report_action(PullRequestAction::Approve, result, console)
        }
        Command::Unapprove(PullRequestArgs { workspace, repo, id }) => {
            let result = client.unapprove_pull_request(&workspace, &repo, id).await;
            report_action(PullRequestAction::Unapprove, result, console)
        }
        Command::Decline(PullRequestArgs { workspace, repo, id }) => {
            let result = client.decline_pull_request(&workspace, &repo, id).await;
            report_action(PullRequestAction::Decline, result, console)
        }
        Command::Merge(PullRequestArgs { workspace, repo, id }) => {
            let result = client.merge_pull_request(&workspace, &repo, id).await;
            report_action(PullRequestAction::Merge, result, console)
        }
        Command::Create {
            workspace,
            repo,
            title,
            source,
            destination,
        } => {
            let pull_request = NewPullRequest::new(title, source, destination);
            create_pull_request(client, &workspace, &repo, &pull_request, console).await
        }
        Command::BranchExists { repo_path, branch } => {
            let exists = client.branch_exists(&repo_path, &branch).await;
            writeln!(console.out, "{exists}")?;
            Ok(())
        }
        Command::Clone { target } => clone_repository(client, cloner, &target, console).await,
    }
}

async fn list_repositories<O: Write, E: Write>(
    client: &BitbucketClient,
    json: bool,
    console: &mut Console<O, E>,
) -> anyhow::Result<()> {
    let repositories = match client.fetch_repositories().await {
        Ok(repositories) => repositories,
        Err(e) => {
            debug!(error = %e, "listing repositories failed");
            writeln!(console.err, "{e}")?;
            return Ok(());
        }
    };

    if json {
        serde_json::to_writer_pretty(&mut console.out, &repositories)?;
        writeln!(console.out)?;
        return Ok(());
    }
    for repo in &repositories {
        writeln!(console.out, "{}\t{}", repo.name_with_workspace, repo.clone_url)?;
    }
    Ok(())
}

async fn list_workspaces<O: Write, E: Write>(
    client: &BitbucketClient,
    console: &mut Console<O, E>,
) -> anyhow::Result<()> {
    for workspace in client.fetch_workspaces().await? {
        writeln!(console.out, "{workspace}")?;
    }
    Ok(())
}

async fn list_pull_requests<O: Write, E: Write>(
    client: &BitbucketClient,
    workspace: &str,
    repo: &str,
    console: &mut Console<O, E>,
) -> anyhow::Result<()> {
    let pull_requests = client.fetch_open_pull_requests(workspace, repo).await?;
    if pull_requests.is_empty() {
        writeln!(console.out, "No open pull requests.")?;
    }
    for pr in &pull_requests {
        writeln!(
            console.out,
            "#{} {} ({} -> {}) {}",
            pr.id,
            pr.title,
            pr.source_branch().unwrap_or("?"),
            pr.destination_branch().unwrap_or("?"),
            pr.html_url().unwrap_or_default(),
        )?;
    }
    Ok(())
}

/// Prints the outcome of a pull request action. Failures are not propagated.
fn report_action<O: Write, E: Write>(
    action: PullRequestAction,
    result: bbpr_bitbucket::Result<()>,
    console: &mut Console<O, E>,
) -> anyhow::Result<()> {
    match result {
        Ok(()) => writeln!(console.out, "{}", action.success_message())?,
        Err(e) => {
            debug!(error = %e, %action, "pull request action failed");
            writeln!(console.err, "{e}")?;
        }
    }
    Ok(())
}

async fn create_pull_request<O: Write, E: Write>(
    client: &BitbucketClient,
    workspace: &str,
    repo: &str,
    pull_request: &NewPullRequest,
    console: &mut Console<O, E>,
) -> anyhow::Result<()> {
    let source = &pull_request.source.branch.name;
    let repo_path = format!("{workspace}/{}", strip_git_suffix(repo));
    if !client.branch_exists(&repo_path, source).await {
        debug!(branch = %source, "source branch not found on remote");
        writeln!(console.err, "Branch {source} was not found on the remote.")?;
    }

    match client.create_pull_request(workspace, repo, pull_request).await {
        Ok(created) => writeln!(
            console.out,
            "Pull request created: {}",
            created.html_url().unwrap_or_default()
        )?,
        Err(e) => {
            debug!(error = %e, "creating pull request failed");
            writeln!(console.err, "{e}")?;
            writeln!(console.err, "{PUSH_HINT}")?;
        }
    }
    Ok(())
}

async fn clone_repository<O: Write, E: Write>(
    client: &BitbucketClient,
    cloner: &GitCloner,
    target: &str,
    console: &mut Console<O, E>,
) -> anyhow::Result<()> {
    let clone_url = if target.starts_with("https://") {
        target.to_string()
    } else {
        let repositories = match client.fetch_repositories().await {
            Ok(repositories) => repositories,
            Err(e) => {
                debug!(error = %e, "listing repositories failed");
                writeln!(console.err, "{e}")?;
                return Ok(());
            }
        };
        match repositories.into_iter().find(|r| r.matches(target)) {
            Some(repo) => repo.clone_url,
            None => bail!("no repository matching {target:?}"),
        }
    };

    writeln!(console.out, "Cloning repository from {clone_url}...")?;
    console.out.flush()?;
    match cloner.clone_repository(&clone_url).await {
        Ok(()) => writeln!(console.out, "Repository cloned successfully!")?,
        Err(e) => {
            debug!(error = %e, "clone failed");
            writeln!(console.err, "Failed to clone repository: {e}")?;
        }
    }
    Ok(())
}
