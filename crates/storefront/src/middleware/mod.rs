//! HTTP middleware stack for the storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. `TraceLayer` (request span)
//! 3. Request ID (recorded in the span and the Sentry scope)
//! 4. Session layer (tower-sessions)
//!
//! [`ClientContext`] is an extractor rather than a layer: only handlers that
//! touch the cart or the auth session pay for rebuilding it. [`JsonBody`]
//! replaces axum's `Json` for request bodies so rejections render as JSON.

pub mod client;
pub mod json;
pub mod request_id;
pub mod session;

pub use client::ClientContext;
pub use json::JsonBody;
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
pub use session::{SESSION_COOKIE_NAME, create_session_layer};
