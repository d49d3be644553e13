//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! tienda-cli migrate
//! tienda-cli migrate --source crates/storefront/migrations
//! ```
//!
//! Applies the storefront migrations (`storefront.cart_storage`) and then
//! creates the tower-sessions table used for browser sessions.

use std::path::Path;

use sqlx::migrate::Migrator;
use tower_sessions_sqlx_store::PostgresStore;

use super::{CommandError, connect};

/// Default location of the storefront migrations, relative to the workspace root.
pub const DEFAULT_SOURCE: &str = "crates/storefront/migrations";

/// Run storefront database migrations.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn run(source: &Path) -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!(source = %source.display(), "Running storefront migrations...");
    let migrator = Migrator::new(source.to_path_buf()).await?;
    migrator.run(&pool).await?;

    tracing::info!("Creating session store table...");
    PostgresStore::new(pool).migrate().await?;

    tracing::info!("Storefront migrations complete!");
    Ok(())
}
