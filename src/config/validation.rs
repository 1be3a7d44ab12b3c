//! Configuration validation.
//!
//! Serde handles syntax; this module checks the values make sense
//! together. Every problem is reported, not just the first one.

use std::net::SocketAddr;

use crate::config::schema::{AuditSinkKind, ProxyConfig};
use crate::upstream::Origin;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// `upstream.origin` is not a usable origin.
    InvalidOrigin(String),
    /// `listener.bind_address` is not a socket address.
    InvalidBindAddress(String),
    /// A timeout was configured as zero seconds.
    ZeroTimeout(&'static str),
    /// `timeouts.request_secs` does not outlast `timeouts.upstream_secs`.
    RequestDeadlineTooShort { request_secs: u64, upstream_secs: u64 },
    /// `audit.channel_capacity` must be at least 1.
    ZeroChannelCapacity,
    /// `audit.sink = "file"` without `audit.path`.
    MissingAuditPath,
    /// `observability.metrics_address` is not a socket address.
    InvalidMetricsAddress(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::InvalidOrigin(e) => write!(f, "upstream.origin: {}", e),
            ValidationError::InvalidBindAddress(addr) => {
                write!(f, "listener.bind_address: '{}' is not a socket address", addr)
            }
            ValidationError::ZeroTimeout(field) => write!(f, "timeouts.{} must be greater than 0", field),
            ValidationError::RequestDeadlineTooShort { request_secs, upstream_secs } => write!(
                f,
                "timeouts.request_secs ({}) must be greater than timeouts.upstream_secs ({})",
                request_secs, upstream_secs
            ),
            ValidationError::ZeroChannelCapacity => write!(f, "audit.channel_capacity must be greater than 0"),
            ValidationError::MissingAuditPath => write!(f, "audit.path is required when audit.sink = \"file\""),
            ValidationError::InvalidMetricsAddress(addr) => {
                write!(f, "observability.metrics_address: '{}' is not a socket address", addr)
            }
        }
    }
}

/// Check a parsed configuration, collecting every error found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(e) = Origin::resolve(&config.upstream.origin) {
        errors.push(ValidationError::InvalidOrigin(e.to_string()));
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(config.listener.bind_address.clone()));
    }

    let timeouts = [
        ("connect_secs", config.timeouts.connect_secs),
        ("request_secs", config.timeouts.request_secs),
        ("upstream_secs", config.timeouts.upstream_secs),
    ];
    for (field, secs) in timeouts {
        if secs == 0 {
            errors.push(ValidationError::ZeroTimeout(field));
        }
    }

    // Inbound deadline must fire after the upstream one.
    if config.timeouts.request_secs <= config.timeouts.upstream_secs {
        errors.push(ValidationError::RequestDeadlineTooShort {
            request_secs: config.timeouts.request_secs,
            upstream_secs: config.timeouts.upstream_secs,
        });
    }

    if config.audit.channel_capacity == 0 {
        errors.push(ValidationError::ZeroChannelCapacity);
    }

    if config.audit.sink == AuditSinkKind::File && config.audit.path.is_none() {
        errors.push(ValidationError::MissingAuditPath);
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
