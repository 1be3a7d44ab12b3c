//! Response interception.
//!
//! The pipeline builds one [`Exchange`] per inbound request and passes it
//! by reference to the interceptor once the upstream answers. Everything
//! an interceptor knows about the request comes from that value, so two
//! concurrent exchanges can never see each other's data.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{HeaderMap, Method, Response, Uri, Version};
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::http::capture::{CaptureError, CapturedBody};
use crate::upstream::ForwardError;

/// Request-scoped context for one client exchange.
#[derive(Debug, Clone)]
pub struct Exchange {
    /// Correlation id (inbound `x-request-id` or a generated UUID).
    pub id: String,
    /// Wall-clock start of the exchange.
    pub started_at: DateTime<Utc>,
    /// Monotonic start of the exchange.
    pub started: Instant,
    pub method: Method,
    /// Path and query as received from the client.
    pub path: String,
    /// Protocol version the client spoke.
    pub version: Version,
    /// Absolute URL the request was forwarded to.
    pub url: Uri,
    /// Headers as forwarded upstream.
    pub headers: HeaderMap,
    /// The captured request body.
    pub body: CapturedBody,
}

impl Exchange {
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// An interceptor could not process the upstream response.
#[derive(Debug, Error)]
pub enum InterceptError {
    #[error("failed to capture response body: {0}")]
    Capture(#[from] CaptureError),
}

/// Hook run after the upstream response arrives and before it is written
/// to the client.
#[async_trait]
pub trait ResponseInterceptor: Send + Sync {
    /// Inspect the upstream response for `exchange`. The returned response
    /// is what the client receives.
    async fn on_response(
        &self,
        exchange: &Exchange,
        response: Response<Body>,
    ) -> Result<Response<Body>, InterceptError>;

    /// Called when no upstream response was obtained.
    async fn on_upstream_error(&self, _exchange: &Exchange, _error: &ForwardError) {}
}
