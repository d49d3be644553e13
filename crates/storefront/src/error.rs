//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server-side errors to
//! Sentry before responding. All route handlers return `Result<T, AppError>`
//! and failures are rendered as `{"error": "<message>"}`.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::auth::{AuthFailure, AuthOperation, ProviderError};
use crate::catalog::CatalogError;
use crate::orders::CheckoutError;
use crate::validation::ValidationError;

const INTERNAL_MESSAGE: &str = "Ocurrió un error inesperado. Intenta de nuevo.";
const CATALOG_UNAVAILABLE: &str = "El catálogo no está disponible en este momento.";
const INVALID_BODY: &str = "Solicitud inválida.";

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Auth error: {0}")]
    Auth(#[from] AuthFailure),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Browser session store failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Request conflicts with current state (e.g. product out of stock).
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Auth(failure) => auth_status(failure),
            Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Checkout(err) => match err {
                CheckoutError::EmptyCart | CheckoutError::Validation(_) => StatusCode::BAD_REQUEST,
                CheckoutError::Rejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
                CheckoutError::Catalog(err) => catalog_status(err),
            },
            Self::Catalog(err) => catalog_status(err),
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show the customer.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Auth(failure) => failure.to_string(),
            Self::Validation(err) => err.to_string(),
            Self::Checkout(CheckoutError::Catalog(err)) | Self::Catalog(err) => {
                catalog_message(err)
            }
            Self::Checkout(err) => err.to_string(),
            Self::NotFound(msg) | Self::BadRequest(msg) | Self::Conflict(msg) => msg.clone(),
            Self::Session(_) | Self::Internal(_) => INTERNAL_MESSAGE.to_string(),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(error = %rejection.body_text(), "Invalid JSON body");
        Self::BadRequest(INVALID_BODY.to_string())
    }
}

fn auth_status(failure: &AuthFailure) -> StatusCode {
    match failure {
        AuthFailure::Validation(_) => StatusCode::BAD_REQUEST,
        AuthFailure::NotSignedIn => StatusCode::UNAUTHORIZED,
        AuthFailure::Provider { .. } if failure.is_upstream_failure() => StatusCode::BAD_GATEWAY,
        AuthFailure::Provider {
            operation, source, ..
        } => match source {
            ProviderError::Api { status: 429, .. } => StatusCode::TOO_MANY_REQUESTS,
            _ if *operation == AuthOperation::Login => StatusCode::UNAUTHORIZED,
            _ => StatusCode::BAD_REQUEST,
        },
    }
}

fn catalog_status(err: &CatalogError) -> StatusCode {
    match err {
        CatalogError::NotFound(_) => StatusCode::NOT_FOUND,
        CatalogError::Rejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::BAD_GATEWAY,
    }
}

fn catalog_message(err: &CatalogError) -> String {
    match err {
        CatalogError::NotFound(_) => "Producto no encontrado.".to_string(),
        CatalogError::Rejected(msg) => msg.clone(),
        _ => CATALOG_UNAVAILABLE.to_string(),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, status = %status, "Request rejected");
        }

        (status, Json(json!({ "error": self.public_message() }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for customer actions.
pub fn add_breadcrumb(category: &str, message: &str, data: &[(&str, String)]) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    for (key, value) in data {
        breadcrumb
            .data
            .insert((*key).to_string(), serde_json::Value::String(value.clone()));
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    fn provider(op: AuthOperation, status: u16, message: &str) -> AppError {
        AppError::Auth(AuthFailure::provider(op, ProviderError::api(status, message)))
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("producto 9".to_string());
        assert_eq!(err.to_string(), "Not found: producto 9");
    }

    #[test]
    fn test_auth_statuses() {
        assert_eq!(
            get_status(provider(AuthOperation::Login, 400, "Invalid login credentials")),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(provider(AuthOperation::Register, 422, "User already registered")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(provider(AuthOperation::Login, 429, "rate limit exceeded")),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            get_status(provider(AuthOperation::Login, 503, "")),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            get_status(AppError::Auth(AuthFailure::NotSignedIn)),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Validation(ValidationError::InvalidEmail)),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_other_statuses() {
        assert_eq!(
            get_status(AppError::Checkout(CheckoutError::EmptyCart)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Checkout(CheckoutError::Rejected("no".into()))),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            get_status(AppError::Catalog(CatalogError::Status { status: 500 })),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            get_status(AppError::Catalog(CatalogError::NotFound("x".into()))),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Conflict("agotado".into())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Internal("boom".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err = AppError::Internal("connection refused on 10.0.0.3".to_string());
        assert_eq!(err.public_message(), INTERNAL_MESSAGE);

        let err = AppError::Catalog(CatalogError::Status { status: 500 });
        assert_eq!(err.public_message(), CATALOG_UNAVAILABLE);
    }

    #[test]
    fn test_auth_message_is_translated() {
        let err = provider(AuthOperation::Login, 400, "Invalid login credentials");
        assert_eq!(err.public_message(), "Correo o contraseña incorrectos.");
    }
}
