//! Catalog route handlers.
//!
//! Thin JSON proxies over [`CatalogClient`](crate::catalog::CatalogClient).

use axum::{
    Json,
    extract::{Path, Query, State},
};
use tracing::instrument;

use tienda_core::ProductId;

use crate::catalog::ProductQuery;
use crate::error::Result;
use crate::models::{Banner, Category, Product, ProductPage, ServiceItem};
use crate::state::AppState;

/// `GET /api/products?pagina&buscar&categoria`
#[instrument(skip(state))]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<ProductPage>> {
    Ok(Json(state.catalog().products(&query).await?))
}

/// `GET /api/products/{id}`
#[instrument(skip(state))]
pub async fn show_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Product>> {
    Ok(Json(state.catalog().product(ProductId::new(id)).await?))
}

/// `GET /api/categories`
#[instrument(skip(state))]
pub async fn categories(State(state): State<AppState>) -> Result<Json<Vec<Category>>> {
    Ok(Json(state.catalog().categories().await?))
}

/// `GET /api/banners`
#[instrument(skip(state))]
pub async fn banners(State(state): State<AppState>) -> Result<Json<Vec<Banner>>> {
    Ok(Json(state.catalog().banners().await?))
}

/// `GET /api/services`
#[instrument(skip(state))]
pub async fn services(State(state): State<AppState>) -> Result<Json<Vec<ServiceItem>>> {
    Ok(Json(state.catalog().services().await?))
}
