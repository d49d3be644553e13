//! Cart storage backends.
//!
//! Carts are stored as raw JSON strings keyed by [`StorageKey`]. Callers
//! treat every failure as best-effort: a failed read is an empty cart, a
//! failed write is logged.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use thiserror::Error;
use tokio::sync::RwLock;

use super::identity::StorageKey;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Key/value store for serialized carts.
#[async_trait]
pub trait CartStorage: Send + Sync {
    async fn read(&self, key: &StorageKey) -> Result<Option<String>, StorageError>;

    async fn write(&self, key: &StorageKey, payload: &str) -> Result<(), StorageError>;

    async fn remove(&self, key: &StorageKey) -> Result<(), StorageError>;
}

// =============================================================================
// In-memory
// =============================================================================

/// Process-local storage for development and tests.
#[derive(Debug, Default)]
pub struct MemoryCartStorage {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryCartStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw payload under `key`.
    pub async fn get(&self, key: &str) -> Option<String> {
        self.entries.read().await.get(key).cloned()
    }

    /// Store a raw payload, bypassing serialization.
    pub async fn put(&self, key: &str, payload: &str) {
        self.entries
            .write()
            .await
            .insert(key.to_string(), payload.to_string());
    }

    /// Keys currently stored, sorted.
    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl CartStorage for MemoryCartStorage {
    async fn read(&self, key: &StorageKey) -> Result<Option<String>, StorageError> {
        Ok(self.get(key.as_str()).await)
    }

    async fn write(&self, key: &StorageKey, payload: &str) -> Result<(), StorageError> {
        self.put(key.as_str(), payload).await;
        Ok(())
    }

    async fn remove(&self, key: &StorageKey) -> Result<(), StorageError> {
        self.entries.write().await.remove(key.as_str());
        Ok(())
    }
}

// =============================================================================
// PostgreSQL
// =============================================================================

/// Carts stored in `storefront.cart_storage`.
#[derive(Debug, Clone)]
pub struct PgCartStorage {
    pool: PgPool,
}

impl PgCartStorage {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CartStorage for PgCartStorage {
    async fn read(&self, key: &StorageKey) -> Result<Option<String>, StorageError> {
        let row = sqlx::query("SELECT payload FROM storefront.cart_storage WHERE storage_key = $1")
            .bind(key.as_str())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| row.try_get("payload")).transpose()?)
    }

    async fn write(&self, key: &StorageKey, payload: &str) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO storefront.cart_storage (storage_key, payload)
            VALUES ($1, $2)
            ON CONFLICT (storage_key)
            DO UPDATE SET payload = EXCLUDED.payload, updated_at = NOW()
            ",
        )
        .bind(key.as_str())
        .bind(payload)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn remove(&self, key: &StorageKey) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM storefront.cart_storage WHERE storage_key = $1")
            .bind(key.as_str())
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
