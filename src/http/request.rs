//! Request identification.
//!
//! Every exchange gets a correlation id used in diagnostics and in its
//! audit record. A client-supplied `x-request-id` is reused; otherwise a
//! UUID v4 is generated. The id is never injected into forwarded headers.

use axum::http::HeaderMap;
use uuid::Uuid;

/// Header carrying a client-supplied correlation id.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Correlation id for a request with the given headers.
pub fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}
