//! Catalog types returned by the catalog API.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tienda_core::{BannerId, CategoryId, ProductId, ProductImageId, ServiceId, SubcategoryId};

use super::cart::CartItem;

/// A product as listed by `productos.php`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    #[serde(rename = "id_producto")]
    pub id: ProductId,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "marca", default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(rename = "descripcion", default)]
    pub description: Option<String>,
    #[serde(rename = "detalles_adicional", default)]
    pub extra_details: Option<String>,
    #[serde(rename = "precio", with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default, deserialize_with = "super::lenient::i64_or_string")]
    pub stock: i64,
    #[serde(rename = "id_categoria", default)]
    pub category_id: Option<CategoryId>,
    #[serde(rename = "id_subcategoria", default)]
    pub subcategory_id: Option<SubcategoryId>,
    #[serde(rename = "tipo_producto", default)]
    pub product_type: Option<String>,
    /// Condition label (new, refurbished, ...).
    #[serde(rename = "estado", default)]
    pub condition: Option<String>,
    #[serde(rename = "imagenes", default)]
    pub images: Vec<ProductImage>,
    #[serde(rename = "imagen_principal", default)]
    pub main_image: Option<String>,
}

impl Product {
    /// Stock as an unsigned count; negative values read as zero.
    #[must_use]
    pub fn available_stock(&self) -> u32 {
        u32::try_from(self.stock.max(0)).unwrap_or(u32::MAX)
    }

    #[must_use]
    pub fn in_stock(&self) -> bool {
        self.stock > 0
    }

    /// Image to show in the cart: the main image, else the first flagged
    /// principal, else the first image.
    #[must_use]
    pub fn display_image(&self) -> String {
        self.main_image
            .clone()
            .filter(|url| !url.is_empty())
            .or_else(|| {
                self.images
                    .iter()
                    .find(|image| image.principal)
                    .or_else(|| self.images.first())
                    .map(|image| image.url.clone())
            })
            .unwrap_or_default()
    }

    /// Build a cart line from catalog data.
    ///
    /// The quantity is passed through unclamped; the cart manager enforces
    /// stock limits.
    #[must_use]
    pub fn to_cart_item(&self, quantity: u32) -> CartItem {
        CartItem {
            product_id: self.id,
            name: self.name.clone(),
            unit_price: self.price,
            quantity,
            image: self.display_image(),
            stock: self.available_stock(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductImage {
    #[serde(rename = "id_imagen")]
    pub id: ProductImageId,
    #[serde(rename = "id_producto", default)]
    pub product_id: Option<ProductId>,
    #[serde(rename = "url_imagen")]
    pub url: String,
    #[serde(default)]
    pub principal: bool,
}

/// One page of a product listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductPage {
    #[serde(rename = "productos", default)]
    pub products: Vec<Product>,
    #[serde(default, deserialize_with = "super::lenient::i64_or_string")]
    pub total: i64,
    #[serde(
        rename = "pagina_actual",
        default,
        deserialize_with = "super::lenient::i64_or_string"
    )]
    pub current_page: i64,
    #[serde(
        rename = "total_paginas",
        default,
        deserialize_with = "super::lenient::i64_or_string"
    )]
    pub total_pages: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    #[serde(rename = "id_categoria")]
    pub id: CategoryId,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "descripcion", default)]
    pub description: Option<String>,
    #[serde(rename = "imagen", default)]
    pub image: Option<String>,
    #[serde(rename = "subcategorias", default)]
    pub subcategories: Vec<Subcategory>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subcategory {
    #[serde(rename = "id_subcategoria")]
    pub id: SubcategoryId,
    #[serde(rename = "id_categoria")]
    pub category_id: CategoryId,
    #[serde(rename = "nombre")]
    pub name: String,
}

/// Home page banner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Banner {
    #[serde(rename = "id_banner")]
    pub id: BannerId,
    #[serde(rename = "titulo", default)]
    pub title: String,
    #[serde(rename = "descripcion", default)]
    pub description: Option<String>,
    #[serde(rename = "imagen_url")]
    pub image_url: String,
    #[serde(rename = "enlace", default)]
    pub link: Option<String>,
    /// Placement slot on the page.
    #[serde(rename = "ubicacion", default)]
    pub placement: Option<String>,
    #[serde(rename = "orden", default, deserialize_with = "super::lenient::i64_or_string")]
    pub position: i64,
    #[serde(rename = "activo", default = "default_true", deserialize_with = "flag")]
    pub active: bool,
}

const fn default_true() -> bool {
    true
}

/// PHP backends send booleans as `true`, `1` or `"1"`.
fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde_json::Value;
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => b,
        Value::Number(n) => n.as_i64().is_some_and(|n| n != 0),
        Value::String(s) => matches!(s.as_str(), "1" | "true"),
        _ => false,
    })
}

/// A Telcel service shown on the services page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceItem {
    #[serde(rename = "id_servicio")]
    pub id: ServiceId,
    #[serde(rename = "nombre")]
    pub name: String,
    pub url: String,
    #[serde(rename = "descripcion", default)]
    pub description: Option<String>,
    #[serde(rename = "imagen_portada", default)]
    pub cover_image: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product_json() -> &'static str {
        r#"{
            "id_producto": 12,
            "nombre": "Samsung Galaxy A15",
            "marca": "Samsung",
            "color": null,
            "descripcion": "Pantalla 6.5\"",
            "precio": 3299.00,
            "stock": "3",
            "id_categoria": 1,
            "id_subcategoria": null,
            "tipo_producto": "equipo",
            "estado": "nuevo",
            "imagenes": [
                {"id_imagen": 1, "id_producto": 12, "url_imagen": "a.jpg", "principal": false},
                {"id_imagen": 2, "id_producto": 12, "url_imagen": "b.jpg", "principal": true}
            ]
        }"#
    }

    #[test]
    fn test_product_parses_loose_types() {
        let product: Product = serde_json::from_str(product_json()).unwrap();
        assert_eq!(product.stock, 3);
        assert_eq!(product.subcategory_id, None);
        assert_eq!(product.color, None);
        assert_eq!(product.price, Decimal::from(3299));
    }

    #[test]
    fn test_display_image_prefers_principal() {
        let product: Product = serde_json::from_str(product_json()).unwrap();
        assert_eq!(product.display_image(), "b.jpg");

        let with_main = Product {
            main_image: Some("main.jpg".to_string()),
            ..product
        };
        assert_eq!(with_main.display_image(), "main.jpg");
    }

    #[test]
    fn test_to_cart_item_copies_catalog_fields() {
        let product: Product = serde_json::from_str(product_json()).unwrap();
        let item = product.to_cart_item(2);
        assert_eq!(item.product_id, ProductId::new(12));
        assert_eq!(item.stock, 3);
        assert_eq!(item.quantity, 2);
        assert_eq!(item.image, "b.jpg");
    }

    #[test]
    fn test_negative_stock_is_unavailable() {
        let mut product: Product = serde_json::from_str(product_json()).unwrap();
        product.stock = -2;
        assert!(!product.in_stock());
        assert_eq!(product.available_stock(), 0);
    }

    #[test]
    fn test_banner_flag_accepts_php_booleans() {
        let banner: Banner = serde_json::from_str(
            r#"{"id_banner": 1, "titulo": "Promo", "imagen_url": "x.jpg", "orden": "2", "activo": "0"}"#,
        )
        .unwrap();
        assert!(!banner.active);
        assert_eq!(banner.position, 2);
    }
}
