//! Proxy-generated responses.
//!
//! When an exchange cannot complete, the client gets a short plain-text
//! status from the proxy itself. Upstream bytes are never forged.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::http::capture::CaptureError;
use crate::http::interceptor::InterceptError;
use crate::upstream::ForwardError;

/// Why an exchange ended without relaying an upstream response.
#[derive(Debug)]
pub enum ExchangeFailure {
    /// The inbound request body could not be captured.
    RequestCapture(CaptureError),
    /// The upstream could not be reached or did not answer.
    Forward(ForwardError),
    /// The interceptor failed on the upstream response.
    Intercept(InterceptError),
}

impl ExchangeFailure {
    pub fn status(&self) -> StatusCode {
        match self {
            ExchangeFailure::RequestCapture(CaptureError::TooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
            ExchangeFailure::RequestCapture(CaptureError::Read(_)) => StatusCode::BAD_REQUEST,
            ExchangeFailure::Forward(e) => e.status(),
            ExchangeFailure::Intercept(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn message(&self) -> &'static str {
        match self {
            ExchangeFailure::RequestCapture(CaptureError::TooLarge { .. }) => "Request body too large",
            ExchangeFailure::RequestCapture(CaptureError::Read(_)) => "Failed to read request body",
            ExchangeFailure::Forward(ForwardError::Timeout(_)) => "Upstream timed out",
            ExchangeFailure::Forward(_) => "Upstream request failed",
            ExchangeFailure::Intercept(_) => "Failed to read upstream response",
        }
    }
}

impl IntoResponse for ExchangeFailure {
    fn into_response(self) -> Response {
        (self.status(), self.message()).into_response()
    }
}
