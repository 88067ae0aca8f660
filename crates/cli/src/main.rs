//! Valiero CLI - database migrations.
//!
//! # Usage
//!
//! ```bash
//! # Apply storefront migrations (schema + session table)
//! valiero-cli migrate
//!
//! # Show which migrations are applied
//! valiero-cli migrate --status
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "valiero-cli")]
#[command(author, version, about = "Valiero storefront CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate {
        /// List migrations instead of applying them
        #[arg(long)]
        status: bool,
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

async fn run(cli: Cli) -> Result<(), commands::migrate::MigrationError> {
    match cli.command {
        Commands::Migrate { status: true } => commands::migrate::status().await,
        Commands::Migrate { status: false } => commands::migrate::run().await,
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_migrate_status() {
        let cli = Cli::try_parse_from(["valiero-cli", "migrate", "--status"]);
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::Migrate { status: true })
        ));
    }
}
