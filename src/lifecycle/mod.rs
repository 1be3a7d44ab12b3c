//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Parse CLI → Load config → Validate → Resolve origin → Open audit sink → Bind
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain in-flight exchanges
//!     → Drop sink handles → Writer flushes remaining records → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal, no request is served
//! - Audit writer outlives the server so queued records are not lost

pub mod shutdown;
pub mod signals;

pub use shutdown::{stopped, Shutdown};
