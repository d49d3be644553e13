//! Catalog API client.
//!
//! Talks to the PHP catalog backend (`productos.php`, `categorias_publicas.php`,
//! `banners_publicos.php`, `servicios_publicos.php`). Every reply carries a
//! `success` flag next to its payload. Responses are cached with `moka`.

mod cache;

use std::sync::Arc;

use moka::future::Cache;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, instrument};
use url::Url;

use tienda_core::ProductId;

use crate::config::CatalogConfig;
use crate::models::{Banner, Category, Product, ProductPage, ServiceItem};

pub use cache::ProductQuery;
use cache::{CacheKey, CacheValue};

/// Errors from the catalog API.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("catalog API returned HTTP {status}")]
    Status { status: u16 },

    #[error("not found: {0}")]
    NotFound(String),

    /// The backend answered with `success: false`.
    #[error("{0}")]
    Rejected(String),

    #[error("invalid catalog URL: {0}")]
    Url(#[from] url::ParseError),
}

impl CatalogError {
    /// Whether the failure is the backend's fault rather than the request's.
    #[must_use]
    pub const fn is_upstream_failure(&self) -> bool {
        !matches!(self, Self::NotFound(_) | Self::Rejected(_))
    }
}

// =============================================================================
// CatalogClient
// =============================================================================

/// Client for the catalog and order backend.
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<CatalogClientInner>,
}

struct CatalogClientInner {
    client: reqwest::Client,
    base_url: Url,
    cache: Cache<CacheKey, CacheValue>,
}

impl CatalogClient {
    #[must_use]
    pub fn new(config: &CatalogConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(config.cache_ttl)
            .build();

        // Url::join drops the last segment unless the base ends with '/'
        let mut base_url = config.api_url.clone();
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Self {
            inner: Arc::new(CatalogClientInner {
                client: reqwest::Client::new(),
                base_url,
                cache,
            }),
        }
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.inner.client
    }

    pub(crate) fn endpoint(&self, path: &str) -> Result<Url, CatalogError> {
        Ok(self.inner.base_url.join(path)?)
    }

    /// GET a catalog endpoint and return the body once `success` is checked.
    async fn fetch(&self, path: &str, params: &[(&str, String)]) -> Result<Value, CatalogError> {
        let response = self
            .inner
            .client
            .get(self.endpoint(path)?)
            .query(params)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            error!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "Catalog API returned non-success status"
            );
            return Err(CatalogError::Status {
                status: status.as_u16(),
            });
        }

        let value: Value = serde_json::from_str(&body).inspect_err(|e| {
            error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse catalog response"
            );
        })?;

        if value.get("success").and_then(Value::as_bool) != Some(true) {
            let message = value
                .get("message")
                .and_then(Value::as_str)
                .filter(|m| !m.trim().is_empty())
                .unwrap_or("El catálogo rechazó la solicitud.");
            return Err(CatalogError::Rejected(message.to_string()));
        }

        Ok(value)
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// List products, optionally paginated, searched, or filtered by category.
    ///
    /// Search results are not cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    #[instrument(skip(self))]
    pub async fn products(&self, query: &ProductQuery) -> Result<ProductPage, CatalogError> {
        let cacheable = query.search().is_none();
        let cache_key = CacheKey::products(query);

        if cacheable
            && let Some(CacheValue::Products(page)) = self.inner.cache.get(&cache_key).await
        {
            debug!("Cache hit for products");
            return Ok(page);
        }

        let mut params = vec![("accion", "listar".to_string())];
        params.extend(query.to_params());

        let body = self.fetch("productos.php", &params).await?;
        let page: ProductPage = serde_json::from_value(body)?;

        if cacheable {
            self.inner
                .cache
                .insert(cache_key, CacheValue::Products(page.clone()))
                .await;
        }

        Ok(page)
    }

    /// Get a single product.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the backend has no such product.
    #[instrument(skip(self), fields(product_id = %id.as_i32()))]
    pub async fn product(&self, id: ProductId) -> Result<Product, CatalogError> {
        let cache_key = CacheKey::Product(id);

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let params = [
            ("accion", "obtener".to_string()),
            ("id", id.as_i32().to_string()),
        ];
        let body = match self.fetch("productos.php", &params).await {
            Err(CatalogError::Rejected(_)) => {
                return Err(CatalogError::NotFound(format!("producto {}", id.as_i32())));
            }
            other => other?,
        };

        let product: Product = take_field(body, "producto")
            .ok_or_else(|| CatalogError::NotFound(format!("producto {}", id.as_i32())))??;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    // =========================================================================
    // Categories, banners, services
    // =========================================================================

    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Vec<Category>, CatalogError> {
        if let Some(CacheValue::Categories(categories)) =
            self.inner.cache.get(&CacheKey::Categories).await
        {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let body = self.fetch("categorias_publicas.php", &[]).await?;
        let categories: Vec<Category> = take_field(body, "categorias").transpose()?.unwrap_or_default();

        self.inner
            .cache
            .insert(CacheKey::Categories, CacheValue::Categories(categories.clone()))
            .await;

        Ok(categories)
    }

    /// Active banners in display order.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    #[instrument(skip(self))]
    pub async fn banners(&self) -> Result<Vec<Banner>, CatalogError> {
        if let Some(CacheValue::Banners(banners)) = self.inner.cache.get(&CacheKey::Banners).await
        {
            debug!("Cache hit for banners");
            return Ok(banners);
        }

        let body = self.fetch("banners_publicos.php", &[]).await?;
        let mut banners: Vec<Banner> = take_field(body, "banners").transpose()?.unwrap_or_default();
        banners.retain(|banner| banner.active);
        banners.sort_by_key(|banner| banner.position);

        self.inner
            .cache
            .insert(CacheKey::Banners, CacheValue::Banners(banners.clone()))
            .await;

        Ok(banners)
    }

    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    #[instrument(skip(self))]
    pub async fn services(&self) -> Result<Vec<ServiceItem>, CatalogError> {
        if let Some(CacheValue::Services(services)) =
            self.inner.cache.get(&CacheKey::Services).await
        {
            debug!("Cache hit for services");
            return Ok(services);
        }

        let body = self.fetch("servicios_publicos.php", &[]).await?;
        let services: Vec<ServiceItem> =
            take_field(body, "servicios").transpose()?.unwrap_or_default();

        self.inner
            .cache
            .insert(CacheKey::Services, CacheValue::Services(services.clone()))
            .await;

        Ok(services)
    }

    /// Drop every cached response.
    pub fn invalidate_cache(&self) {
        self.inner.cache.invalidate_all();
    }
}

/// Deserialize `body[field]`. `None` if the field is missing or null.
fn take_field<T: DeserializeOwned>(
    mut body: Value,
    field: &str,
) -> Option<Result<T, serde_json::Error>> {
    match body.get_mut(field).map(Value::take) {
        None | Some(Value::Null) => None,
        Some(value) => Some(serde_json::from_value(value)),
    }
}
