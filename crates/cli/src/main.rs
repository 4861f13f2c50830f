//! Muhan CLI - database migrations and admin role management.
//!
//! # Usage
//!
//! ```bash
//! # Apply pending migrations
//! muhan-cli migrate
//!
//! # Give a user access to the admin API
//! muhan-cli admin grant --user 3f0e2c1a-8d1b-4f7e-9a55-0c6a1b2d3e4f
//!
//! # Take it away again
//! muhan-cli admin revoke --user 3f0e2c1a-8d1b-4f7e-9a55-0c6a1b2d3e4f
//! ```
//!
//! Both commands read `MUHAN_DATABASE_URL` (or `DATABASE_URL`), loading
//! `.env` when present.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use muhan_core::UserRole;
use uuid::Uuid;

mod commands;

#[derive(Debug, Parser)]
#[command(name = "muhan-cli")]
#[command(author, version, about = "Muhan CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage admin access
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Debug, Subcommand)]
enum AdminAction {
    /// Grant the admin role
    Grant {
        /// Hosted auth user id
        #[arg(short, long)]
        user: Uuid,
    },
    /// Revoke the admin role
    Revoke {
        /// Hosted auth user id
        #[arg(short, long)]
        user: Uuid,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await,
        Commands::Admin { action } => match action {
            AdminAction::Grant { user } => commands::admin::set_role(user, UserRole::Admin).await,
            AdminAction::Revoke { user } => commands::admin::set_role(user, UserRole::User).await,
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_admin_grant() {
        let cli = Cli::try_parse_from([
            "muhan-cli",
            "admin",
            "grant",
            "--user",
            "3f0e2c1a-8d1b-4f7e-9a55-0c6a1b2d3e4f",
        ])
        .unwrap();
        match cli.command {
            Commands::Admin {
                action: AdminAction::Grant { user },
            } => assert_eq!(user.to_string(), "3f0e2c1a-8d1b-4f7e-9a55-0c6a1b2d3e4f"),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_rejects_bad_user_id() {
        let args = ["muhan-cli", "admin", "revoke", "--user", "not-a-uuid"];
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn test_parse_migrate() {
        let cli = Cli::try_parse_from(["muhan-cli", "migrate"]).unwrap();
        assert!(matches!(cli.command, Commands::Migrate));
    }
}
