//! Intercepting audit reverse proxy library.
//!
//! Forwards every request to one upstream origin and writes a JSON-lines
//! audit record of each request/response pair.

pub mod audit;
pub mod cli;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod upstream;

pub use audit::{AuditInterceptor, AuditRecord, AuditSink};
pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use upstream::Origin;
