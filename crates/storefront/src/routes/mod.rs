//! HTTP route handlers for the storefront API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                          - Liveness
//! GET    /health/ready                    - Readiness (database)
//!
//! # Catalog
//! GET    /api/products                    - Product listing (?pagina&buscar&categoria)
//! GET    /api/products/{id}               - Product detail
//! GET    /api/categories                  - Categories with subcategories
//! GET    /api/banners                     - Active home banners
//! GET    /api/services                    - Telcel services
//!
//! # Cart
//! GET    /api/cart                        - Items and totals
//! POST   /api/cart/items                  - Add a product
//! PATCH  /api/cart/items/{product_id}     - Set quantity
//! DELETE /api/cart/items/{product_id}     - Remove a line
//! DELETE /api/cart                        - Empty the cart
//!
//! # Checkout
//! POST   /api/checkout                    - Place an order
//!
//! # Auth
//! GET    /api/auth/session                - Current auth snapshot
//! POST   /api/auth/login
//! POST   /api/auth/register
//! POST   /api/auth/logout
//! POST   /api/auth/password/reset-request - Send a reset code (email or SMS)
//! POST   /api/auth/password/reset-link    - Email a recovery link
//! POST   /api/auth/password/reset-confirm - Verify code and set a new password
//! POST   /api/auth/phone                  - Change phone number
//! ```

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;

use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware,
    routing::{get, patch, post},
};
use tower_http::trace::TraceLayer;
use tower_sessions::{SessionManagerLayer, SessionStore};

use crate::db;
use crate::middleware::request_id_middleware;
use crate::state::AppState;

/// Create the catalog routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(catalog::list_products))
        .route("/products/{id}", get(catalog::show_product))
        .route("/categories", get(catalog::categories))
        .route("/banners", get(catalog::banners))
        .route("/services", get(catalog::services))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route("/items", post(cart::add_item))
        .route(
            "/items/{product_id}",
            patch(cart::update_item).delete(cart::remove_item),
        )
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/session", get(auth::session))
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        .route("/logout", post(auth::logout))
        .route(
            "/password/reset-request",
            post(auth::request_password_reset),
        )
        .route("/password/reset-link", post(auth::send_password_reset_link))
        .route(
            "/password/reset-confirm",
            post(auth::confirm_password_reset),
        )
        .route("/phone", post(auth::update_phone))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/api", catalog_routes())
        .nest("/api/cart", cart_routes())
        .route("/api/checkout", post(checkout::submit))
        .nest("/api/auth", auth_routes())
}

/// Full application: routes, sessions, request ids and tracing.
///
/// Sentry layers are added by the binary on top of this.
pub fn app<S>(state: AppState, session_layer: SessionManagerLayer<S>) -> Router
where
    S: SessionStore + Clone,
{
    routes()
        .layer(session_layer)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            tracing::info_span!(
                "request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = tracing::field::Empty,
                user_id = tracing::field::Empty,
            )
        }))
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    let Some(pool) = state.pool() else {
        return StatusCode::OK;
    };
    match db::ping(pool).await {
        Ok(()) => StatusCode::OK,
        Err(err) => {
            tracing::warn!(error = %err, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
