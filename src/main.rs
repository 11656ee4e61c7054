//! bbpr - a command-line client for Bitbucket Cloud pull requests.
//!
//! This is the main binary: it parses arguments, sets up logging, loads the
//! stored credentials and dispatches to the command handlers.

mod cli;
mod commands;

use bbpr_bitbucket::{BitbucketClient, GitCloner};
use bbpr_config::persistence::resolve_credentials_path;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::commands::Console;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let path = resolve_credentials_path(cli.config.clone())?;
    let mut console = Console::stdio();

    if matches!(cli.command, Command::Login) {
        commands::login(&path, &mut std::io::stdin().lock(), &mut console)?;
        return Ok(());
    }

    let credentials =
        commands::credentials_or_login(&path, &mut std::io::stdin().lock(), &mut console)?;

    let settings = cli.client_settings()?;
    let client = BitbucketClient::new(&credentials, &settings)?;
    commands::run(&client, &GitCloner::new(), cli.command, &mut console).await
}

/// Filter used when `RUST_LOG` is unset. Failures are already printed by the
/// command handlers, so library warnings stay hidden unless asked for.
fn default_filter(verbose: bool) -> &'static str {
    if verbose { "debug" } else { "error" }
}

/// Installs a stderr subscriber. `RUST_LOG` takes precedence over `--verbose`.
fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
