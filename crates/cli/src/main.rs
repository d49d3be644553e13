//! Tienda Telcel CLI - Database migrations and maintenance tools.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations (cart storage + sessions)
//! tienda-cli migrate
//!
//! # Delete stale guest carts
//! tienda-cli carts prune --older-than-days 30
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "tienda-cli")]
#[command(author, version, about = "Tienda Telcel CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run storefront database migrations
    Migrate {
        /// Directory containing the migration files
        #[arg(long, default_value = commands::migrate::DEFAULT_SOURCE)]
        source: PathBuf,
    },
    /// Maintain stored carts
    Carts {
        #[command(subcommand)]
        action: CartsAction,
    },
}

#[derive(Subcommand)]
enum CartsAction {
    /// Delete guest carts that have not changed recently
    Prune {
        /// Minimum age in days
        #[arg(long, default_value_t = 30)]
        older_than_days: u32,

        /// Cart storage key prefix
        #[arg(long, env = "STOREFRONT_CART_KEY", default_value = "telcel_cart")]
        key_prefix: String,
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
        Commands::Migrate { source } => commands::migrate::run(&source).await?,
        Commands::Carts { action } => match action {
            CartsAction::Prune {
                older_than_days,
                key_prefix,
            } => {
                commands::carts::prune(&key_prefix, older_than_days).await?;
            }
        },
    }
    Ok(())
}
