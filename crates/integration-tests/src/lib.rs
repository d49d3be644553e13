//! Integration tests for the Tienda Telcel storefront.
//!
//! Each [`TestContext`] starts two servers on ephemeral ports:
//!
//! - a mock catalog API serving fixed products and recording orders
//! - the storefront itself, with in-memory sessions, cart storage and
//!   identity provider
//!
//! Tests drive the storefront over HTTP with a cookie-keeping client, the
//! way a browser would.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p tienda-integration-tests
//! ```

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::HeaderMap,
    routing::{get, post},
};
use secrecy::SecretString;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use url::Url;

use tienda_core::{Email, UserId};
use tienda_storefront::auth::{InMemoryIdentityProvider, UserMetadata};
use tienda_storefront::cart::MemoryCartStorage;
use tienda_storefront::config::{CartConfig, CatalogConfig, IdentityConfig, StorefrontConfig};
use tienda_storefront::middleware::create_session_layer;
use tienda_storefront::routes;
use tienda_storefront::state::AppState;

/// Password used by seeded accounts.
pub const PASSWORD: &str = "secreto1";

// ============================================================================
// Mock catalog API
// ============================================================================

/// An order received by the mock catalog.
#[derive(Debug, Clone)]
pub struct RecordedOrder {
    pub body: Value,
    pub authorization: Option<String>,
}

/// Shared state of the mock catalog API.
#[derive(Debug, Default)]
pub struct MockCatalog {
    orders: Mutex<Vec<RecordedOrder>>,
    reject_orders: AtomicBool,
    category_hits: AtomicUsize,
}

impl MockCatalog {
    pub async fn orders(&self) -> Vec<RecordedOrder> {
        self.orders.lock().await.clone()
    }

    /// Make `procesar_pedido.php` answer `success: false`.
    pub fn reject_orders(&self) {
        self.reject_orders.store(true, Ordering::SeqCst);
    }

    /// Times `categorias_publicas.php` was called.
    pub fn category_hits(&self) -> usize {
        self.category_hits.load(Ordering::SeqCst)
    }
}

fn products() -> Vec<Value> {
    vec![
        json!({
            "id_producto": 1,
            "nombre": "Samsung Galaxy A15",
            "marca": "Samsung",
            "precio": 3299.0,
            "stock": 5,
            "id_categoria": 1,
            "imagenes": [
                {"id_imagen": 10, "id_producto": 1, "url_imagen": "a15-back.jpg", "principal": false},
                {"id_imagen": 11, "id_producto": 1, "url_imagen": "a15.jpg", "principal": true}
            ]
        }),
        json!({
            "id_producto": 2,
            "nombre": "Funda transparente",
            "precio": 199.0,
            "stock": "2",
            "id_categoria": 2,
            "imagenes": []
        }),
        json!({
            "id_producto": 3,
            "nombre": "Motorola G84",
            "precio": 4599.0,
            "stock": 0,
            "id_categoria": 1,
            "imagenes": []
        }),
        json!({
            "id_producto": 4,
            "nombre": "Chip Telcel",
            "precio": 50.0,
            "stock": 100,
            "id_categoria": 3,
            "imagen_principal": "chip.png"
        }),
    ]
}

async fn productos(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    let all = products();
    match params.get("accion").map(String::as_str) {
        Some("obtener") => {
            let id = params.get("id").and_then(|id| id.parse::<i64>().ok());
            let found = all
                .into_iter()
                .find(|p| p["id_producto"].as_i64() == id);
            Json(found.map_or_else(
                || json!({"success": false, "message": "Producto no encontrado"}),
                |producto| json!({"success": true, "producto": producto}),
            ))
        }
        Some("listar") => {
            let search = params.get("buscar").map(|s| s.to_lowercase());
            let category = params.get("categoria").and_then(|c| c.parse::<i64>().ok());
            let productos: Vec<Value> = all
                .into_iter()
                .filter(|p| {
                    search.as_ref().is_none_or(|s| {
                        p["nombre"]
                            .as_str()
                            .is_some_and(|n| n.to_lowercase().contains(s))
                    })
                })
                .filter(|p| category.is_none_or(|c| p["id_categoria"].as_i64() == Some(c)))
                .collect();
            let pagina = params.get("pagina").cloned().unwrap_or_else(|| "1".to_string());
            Json(json!({
                "success": true,
                "total": productos.len(),
                "pagina_actual": pagina,
                "total_paginas": 1,
                "productos": productos,
            }))
        }
        _ => Json(json!({"success": false, "message": "Acción no válida"})),
    }
}

async fn categorias(State(mock): State<Arc<MockCatalog>>) -> Json<Value> {
    mock.category_hits.fetch_add(1, Ordering::SeqCst);
    Json(json!({
        "success": true,
        "categorias": [
            {
                "id_categoria": 1,
                "nombre": "Celulares",
                "subcategorias": [
                    {"id_subcategoria": 1, "id_categoria": 1, "nombre": "Android"}
                ]
            },
            {"id_categoria": 2, "nombre": "Accesorios"}
        ]
    }))
}

async fn banners() -> Json<Value> {
    Json(json!({
        "success": true,
        "banners": [
            {"id_banner": 1, "titulo": "Hot Sale", "imagen_url": "hot.jpg", "orden": 2, "activo": 1},
            {"id_banner": 2, "titulo": "Viejo", "imagen_url": "old.jpg", "orden": 0, "activo": "0"},
            {"id_banner": 3, "titulo": "Portada", "imagen_url": "home.jpg", "orden": "1", "activo": true}
        ]
    }))
}

async fn servicios() -> Json<Value> {
    Json(json!({
        "success": true,
        "servicios": [
            {"id_servicio": 1, "nombre": "Recargas", "url": "https://www.telcel.com/recargas"}
        ]
    }))
}

async fn procesar_pedido(
    State(mock): State<Arc<MockCatalog>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    if mock.reject_orders.load(Ordering::SeqCst) {
        return Json(json!({
            "success": false,
            "message": "Sin cobertura en tu código postal."
        }));
    }

    let authorization = headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .map(String::from);
    let mut orders = mock.orders.lock().await;
    orders.push(RecordedOrder {
        body,
        authorization,
    });

    Json(json!({
        "success": true,
        "message": "Pedido registrado",
        "id_pedido": 1000 + orders.len(),
        "whatsapp_url": "https://wa.me/5215500000000",
        "estado_pedido": "pendiente",
        "estado_pago": "pendiente"
    }))
}

fn mock_catalog_router(mock: Arc<MockCatalog>) -> Router {
    Router::new()
        .route("/api/productos.php", get(productos))
        .route("/api/categorias_publicas.php", get(categorias))
        .route("/api/banners_publicos.php", get(banners))
        .route("/api/servicios_publicos.php", get(servicios))
        .route("/api/procesar_pedido.php", post(procesar_pedido))
        .with_state(mock)
}

async fn serve(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Listener has no address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Test server error");
    });
    addr
}

// ============================================================================
// TestContext
// ============================================================================

/// A running storefront plus handles to its in-memory backends.
pub struct TestContext {
    pub client: reqwest::Client,
    pub base_url: String,
    pub provider: Arc<InMemoryIdentityProvider>,
    pub carts: Arc<MemoryCartStorage>,
    pub catalog: Arc<MockCatalog>,
}

impl TestContext {
    pub async fn new() -> Self {
        Self::with_provider(InMemoryIdentityProvider::new()).await
    }

    pub async fn with_provider(provider: InMemoryIdentityProvider) -> Self {
        let catalog = Arc::new(MockCatalog::default());
        let catalog_addr = serve(mock_catalog_router(catalog.clone())).await;

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind storefront listener");
        let addr = listener.local_addr().expect("Listener has no address");
        let base_url = format!("http://{addr}");

        let config = StorefrontConfig {
            database_url: SecretString::from("postgres://unused"),
            host: addr.ip(),
            port: addr.port(),
            base_url: base_url.clone(),
            catalog: CatalogConfig {
                api_url: Url::parse(&format!("http://{catalog_addr}/api/")).unwrap(),
                cache_ttl: Duration::from_secs(60),
            },
            identity: IdentityConfig {
                url: Url::parse("http://127.0.0.1:9/").unwrap(),
                api_key: SecretString::from("unused"),
                profile_table: "profiles".to_string(),
            },
            cart: CartConfig::default(),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 0.0,
            sentry_traces_sample_rate: 0.0,
        };

        let provider = Arc::new(provider);
        let carts = Arc::new(MemoryCartStorage::new());
        let session_layer =
            create_session_layer(tower_sessions::MemoryStore::default(), &config);
        let state = AppState::from_parts(config, provider.clone(), carts.clone(), None);
        let app = routes::app(state, session_layer);

        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Storefront server error");
        });

        Self {
            client: Self::browser(),
            base_url,
            provider,
            carts,
            catalog,
        }
    }

    /// A fresh client with its own cookie jar.
    pub fn browser() -> reqwest::Client {
        reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .expect("Failed to create HTTP client")
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Seed a confirmed account with [`PASSWORD`].
    pub async fn seed_user(&self, email: &str, nombre: &str) -> UserId {
        let email = Email::parse(email).expect("valid test email");
        self.provider
            .add_user(
                &email,
                PASSWORD,
                UserMetadata {
                    nombre: Some(nombre.to_string()),
                    apellido_paterno: Some("López".to_string()),
                    apellido_materno: Some("Pérez".to_string()),
                    rol: None,
                },
            )
            .await
    }

    pub async fn get(&self, client: &reqwest::Client, path: &str) -> reqwest::Response {
        client
            .get(self.url(path))
            .send()
            .await
            .expect("request failed")
    }

    pub async fn post(&self, client: &reqwest::Client, path: &str, body: Value) -> reqwest::Response {
        client
            .post(self.url(path))
            .json(&body)
            .send()
            .await
            .expect("request failed")
    }

    pub async fn login(&self, client: &reqwest::Client, email: &str, password: &str) -> reqwest::Response {
        self.post(
            client,
            "/api/auth/login",
            json!({"correo": email, "contrasena": password}),
        )
        .await
    }

    pub async fn add_to_cart(
        &self,
        client: &reqwest::Client,
        product_id: i32,
        quantity: u32,
    ) -> reqwest::Response {
        self.post(
            client,
            "/api/cart/items",
            json!({"product_id": product_id, "quantity": quantity}),
        )
        .await
    }

    /// `GET /api/cart` as JSON.
    pub async fn cart(&self, client: &reqwest::Client) -> Value {
        self.get(client, "/api/cart")
            .await
            .json()
            .await
            .expect("cart is JSON")
    }
}

/// `(product id, quantity)` pairs of a cart summary, in cart order.
pub fn lines(cart: &Value) -> Vec<(i64, i64)> {
    cart["items"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .map(|item| {
                    (
                        item["id_producto"].as_i64().unwrap_or_default(),
                        item["cantidad"].as_i64().unwrap_or_default(),
                    )
                })
                .collect()
        })
        .unwrap_or_default()
}
