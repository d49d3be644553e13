//! Database access for the storefront `PostgreSQL`.
//!
//! The catalog and orders live in the remote catalog API and accounts live
//! in the identity provider, so this database only holds:
//!
//! ## Tables
//!
//! - `storefront.cart_storage` - Serialized carts keyed by storage key
//! - `tower_sessions.session` - Browser sessions (created by the session store)
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p tienda-cli -- migrate
//! ```

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Create a `PostgreSQL` connection pool.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn create_pool(database_url: &SecretString) -> Result<PgPool, RepositoryError> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await?;
    Ok(pool)
}

/// Round-trip a trivial query.
///
/// # Errors
///
/// Returns an error if the database is unreachable.
pub async fn ping(pool: &PgPool) -> Result<(), RepositoryError> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
