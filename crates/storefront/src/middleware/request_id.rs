//! Request ID middleware.
//!
//! Every response carries an `x-request-id`. An id forwarded by a proxy is
//! reused when it looks sane; otherwise a UUID v4 is generated. The id is
//! recorded on the request span and tagged on the Sentry scope.

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use tracing::Span;
use uuid::Uuid;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

const MAX_FORWARDED_LEN: usize = 128;

fn forwarded_id(request: &Request) -> Option<String> {
    request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|id| {
            !id.is_empty()
                && id.len() <= MAX_FORWARDED_LEN
                && id.chars().all(|c| c.is_ascii_graphic())
        })
        .map(String::from)
}

pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = forwarded_id(&request).unwrap_or_else(|| Uuid::new_v4().to_string());

    Span::current().record("request_id", request_id.as_str());
    sentry::configure_scope(|scope| {
        scope.set_tag("request_id", &request_id);
    });

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}
