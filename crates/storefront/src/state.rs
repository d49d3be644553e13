//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::auth::{IdentityProvider, SupabaseAuth};
use crate::cart::{CartStorage, PgCartStorage};
use crate::catalog::CatalogClient;
use crate::config::StorefrontConfig;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. Per-client state (auth
/// session, cart) is not kept here; it is rebuilt for every request from
/// the browser session and cart storage.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    catalog: CatalogClient,
    identity: Arc<dyn IdentityProvider>,
    cart_storage: Arc<dyn CartStorage>,
    pool: Option<PgPool>,
}

impl AppState {
    /// Production state: Supabase identity and carts in `PostgreSQL`.
    #[must_use]
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Self {
        let identity = Arc::new(SupabaseAuth::new(&config.identity));
        let cart_storage = Arc::new(PgCartStorage::new(pool.clone()));
        Self::from_parts(config, identity, cart_storage, Some(pool))
    }

    /// Assemble state from explicit backends.
    ///
    /// Without a pool the readiness check only reports the process as up.
    #[must_use]
    pub fn from_parts(
        config: StorefrontConfig,
        identity: Arc<dyn IdentityProvider>,
        cart_storage: Arc<dyn CartStorage>,
        pool: Option<PgPool>,
    ) -> Self {
        let catalog = CatalogClient::new(&config.catalog);
        Self {
            inner: Arc::new(AppStateInner {
                config,
                catalog,
                identity,
                cart_storage,
                pool,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn catalog(&self) -> &CatalogClient {
        &self.inner.catalog
    }

    #[must_use]
    pub fn identity(&self) -> Arc<dyn IdentityProvider> {
        Arc::clone(&self.inner.identity)
    }

    #[must_use]
    pub fn cart_storage(&self) -> Arc<dyn CartStorage> {
        Arc::clone(&self.inner.cart_storage)
    }

    #[must_use]
    pub fn pool(&self) -> Option<&PgPool> {
        self.inner.pool.as_ref()
    }
}
