//! Audit subsystem.
//!
//! # Data Flow
//! ```text
//! Exchange + upstream response
//!     → interceptor.rs (capture response body, build record)
//!     → record.rs (schema) + encoding.rs (body rendering)
//!     → sink.rs (serialize, try_send to writer task)
//!     → stdout / file, one JSON object per line
//! ```
//!
//! # Design Decisions
//! - Records are serialized on the exchange's task, written by one task
//! - Emitting never waits on the output; a full channel drops the record
//! - Bodies are text when valid UTF-8, base64 otherwise (configurable)

pub mod encoding;
pub mod interceptor;
pub mod record;
pub mod sink;

pub use interceptor::AuditInterceptor;
pub use record::{AuditRecord, RequestRecord, ResponseRecord};
pub use sink::{AuditError, AuditSink};
