//! Cart storage maintenance.
//!
//! # Usage
//!
//! ```bash
//! # Delete guest carts untouched for 30 days
//! tienda-cli carts prune --older-than-days 30
//! ```

use super::{CommandError, connect};

/// Delete guest carts not updated in `older_than_days` days.
///
/// User carts are kept; they belong to an account.
///
/// # Errors
///
/// Returns an error if the database is unreachable or the delete fails.
pub async fn prune(key_prefix: &str, older_than_days: u32) -> Result<u64, CommandError> {
    let pool = connect().await?;

    let result = sqlx::query(
        r"
        DELETE FROM storefront.cart_storage
        WHERE storage_key LIKE $1
          AND updated_at < NOW() - make_interval(days => $2)
        ",
    )
    .bind(format!("{key_prefix}:guest:%"))
    .bind(i32::try_from(older_than_days).unwrap_or(i32::MAX))
    .execute(&pool)
    .await?;

    let deleted = result.rows_affected();
    tracing::info!(deleted, older_than_days, "Pruned guest carts");
    Ok(deleted)
}
