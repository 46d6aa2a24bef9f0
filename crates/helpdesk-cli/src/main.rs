//! Command line front end for the helpdesk.
//!
//! Usage:
//! ```bash
//! helpdesk login                          # Check credentials, show identity
//! helpdesk tickets list --status NEW      # List tickets
//! helpdesk tickets show 42                # Ticket detail and comments
//! helpdesk tickets status 42 ON_HOLD --hold-reason "Waiting on vendor"
//! helpdesk tickets watch 42               # Follow a ticket until Ctrl-C
//! helpdesk users list --role AGENT        # Administration (admins only)
//! helpdesk departments minimal
//! ```
//!
//! Credentials come from `--username`/`--password` or `HELPDESK_USERNAME` and
//! `HELPDESK_PASSWORD`; every command signs in first.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Debug, Parser)]
#[command(name = "helpdesk", author, version, about)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

/// Connection settings shared by every command.
#[derive(Debug, Clone, Default, Args)]
pub struct GlobalArgs {
    /// Config file to use instead of the resolved `helpdesk.toml`.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Server base URL, overriding the config file.
    #[arg(long, global = true, env = "HELPDESK_ENDPOINT")]
    pub endpoint: Option<String>,

    #[arg(short, long, global = true, env = "HELPDESK_USERNAME")]
    pub username: Option<String>,

    #[arg(long, global = true, env = "HELPDESK_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Sign in and show the current identity
    Login,

    /// Change your own password
    ChangePassword(commands::account::ChangePasswordArgs),

    /// Work with tickets
    #[command(subcommand)]
    Tickets(commands::tickets::TicketCommand),

    /// Administer users (admins only)
    #[command(subcommand)]
    Users(commands::users::UserCommand),

    /// Administer departments (admins only)
    #[command(subcommand)]
    Departments(commands::departments::DepartmentCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("info".parse().context("failed to parse log directive")?),
        )
        .init();

    let cli = Cli::parse();
    let session = commands::connect(&cli.global).await?;

    match &cli.command {
        Command::Login => {
            commands::account::whoami(&session);
            Ok(())
        }
        Command::ChangePassword(args) => {
            commands::account::change_password(&session, &cli.global, args).await
        }
        Command::Tickets(command) => commands::tickets::run(&session, command).await,
        Command::Users(command) => commands::users::run(&session, command).await,
        Command::Departments(command) => commands::departments::run(&session, command).await,
    }
}
