//! Upstream subsystem.
//!
//! # Data Flow
//! ```text
//! configured origin string
//!     → origin.rs (resolve once at startup → Origin)
//!
//! per request:
//!     → forwarder.rs rewrite (absolute URI, Host header, hop-by-hop stripped)
//!     → forwarder.rs forward (connect timeout, response deadline)
//!     → upstream response handed back to the pipeline
//! ```

pub mod forwarder;
pub mod headers;
pub mod origin;

pub use forwarder::{ForwardError, Forwarder};
pub use origin::{InvalidOriginError, Origin};
