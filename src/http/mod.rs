//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, catch-all handler)
//!     → request.rs (correlation id)
//!     → capture.rs (request body → bytes + replay body)
//!     → upstream::Forwarder (rewrite, forward)
//!     → interceptor.rs (ResponseInterceptor::on_response with the Exchange)
//!     → response.rs (proxy-generated status when the exchange fails)
//!     → Send to client
//! ```

pub mod capture;
pub mod interceptor;
pub mod request;
pub mod response;
pub mod server;

pub use capture::{capture, CaptureError, CapturedBody};
pub use interceptor::{Exchange, InterceptError, ResponseInterceptor};
pub use request::{request_id, X_REQUEST_ID};
pub use server::HttpServer;
