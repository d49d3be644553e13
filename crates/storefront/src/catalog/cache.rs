//! Cache types for catalog API responses.

use serde::Deserialize;

use tienda_core::{CategoryId, ProductId};

use crate::models::{Banner, Category, Product, ProductPage, ServiceItem};

/// Filters for a product listing.
///
/// Unset, zero, and blank filters are left out of the upstream query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(default)]
pub struct ProductQuery {
    pub pagina: Option<u32>,
    pub buscar: Option<String>,
    pub categoria: Option<CategoryId>,
}

impl ProductQuery {
    /// Query string pairs sent next to `accion=listar`.
    #[must_use]
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(pagina) = self.pagina.filter(|p| *p > 0) {
            params.push(("pagina", pagina.to_string()));
        }
        if let Some(buscar) = self.search() {
            params.push(("buscar", buscar.to_string()));
        }
        if let Some(categoria) = self.categoria.filter(|c| c.as_i32() > 0) {
            params.push(("categoria", categoria.as_i32().to_string()));
        }
        params
    }

    /// Trimmed search text, if any.
    #[must_use]
    pub fn search(&self) -> Option<&str> {
        self.buscar.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Product(ProductId),
    /// Normalized listing parameters, so equivalent queries share an entry.
    Products(Vec<(&'static str, String)>),
    Categories,
    Banners,
    Services,
}

impl CacheKey {
    #[must_use]
    pub fn products(query: &ProductQuery) -> Self {
        Self::Products(query.to_params())
    }
}

#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    Products(ProductPage),
    Categories(Vec<Category>),
    Banners(Vec<Banner>),
    Services(Vec<ServiceItem>),
}
