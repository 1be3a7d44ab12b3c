//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Pipeline, forwarder, audit writer produce:
//!     → logging.rs (structured tracing events on stderr)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Log aggregation (stderr, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! Audit records are not diagnostics; they live in `crate::audit`.

pub mod logging;
pub mod metrics;
