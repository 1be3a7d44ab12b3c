//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! ProxyConfig::default()
//!     → loader.rs (optional TOML file)
//!     → cli.rs (--host / --port / --bind overrides)
//!     → validation.rs (semantic checks, all errors collected)
//!     → ProxyConfig (validated, immutable for the process lifetime)
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Any validation error is fatal at startup

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{read_config, ConfigError};
pub use schema::{
    AuditConfig, AuditSinkKind, BodyEncoding, ListenerConfig, LogFormat, ObservabilityConfig,
    ProxyConfig, TimeoutConfig, UpstreamConfig,
};
pub use validation::{validate_config, ValidationError};
