//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for the intercepting proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// The single upstream every request is forwarded to.
    pub upstream: UpstreamConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Audit record output.
    pub audit: AuditConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Upstream configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Origin URL, e.g. "https://api.internal".
    pub origin: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            origin: "https://example.com".to_string(),
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Upstream connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Whole-exchange deadline on the client side in seconds. Must exceed
    /// `upstream_secs` so a slow upstream surfaces as a gateway timeout.
    pub request_secs: u64,

    /// Time allowed for the upstream to answer with response headers.
    pub upstream_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 30,
            upstream_secs: 10,
        }
    }
}

/// Where audit records are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditSinkKind {
    Stdout,
    File,
}

/// How captured bodies are rendered in audit records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BodyEncoding {
    /// UTF-8 text when valid, base64 otherwise.
    #[default]
    Auto,
    /// Always text; invalid sequences are replaced.
    Utf8,
    /// Always standard base64.
    Base64,
}

/// Audit output configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Sink target.
    pub sink: AuditSinkKind,

    /// File path, required when `sink = "file"`.
    pub path: Option<PathBuf>,

    /// Body rendering policy.
    pub body_encoding: BodyEncoding,

    /// Records buffered between exchanges and the writer task.
    /// When full, new records are dropped rather than stalling traffic.
    pub channel_capacity: usize,

    /// Optional cap on captured body size. Unset means bodies are bounded
    /// only by available memory.
    pub max_body_bytes: Option<usize>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            sink: AuditSinkKind::Stdout,
            path: None,
            body_encoding: BodyEncoding::Auto,
            channel_capacity: 4096,
            max_body_bytes: None,
        }
    }
}

/// Diagnostic log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Diagnostic log format. Logs always go to stderr.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: ProxyConfig = toml::from_str(
            r#"
            [upstream]
            origin = "http://127.0.0.1:3000"

            [audit]
            body_encoding = "base64"
            "#,
        )
        .unwrap();

        assert_eq!(config.upstream.origin, "http://127.0.0.1:3000");
        assert_eq!(config.audit.body_encoding, BodyEncoding::Base64);
        assert_eq!(config.audit.sink, AuditSinkKind::Stdout);
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.timeouts.request_secs, 30);
        assert!(config.audit.max_body_bytes.is_none());
    }

    #[test]
    fn test_file_sink() {
        let config: ProxyConfig = toml::from_str(
            r#"
            [audit]
            sink = "file"
            path = "/var/log/proxy/audit.jsonl"
            max_body_bytes = 1048576
            "#,
        )
        .unwrap();

        assert_eq!(config.audit.sink, AuditSinkKind::File);
        assert_eq!(config.audit.path.as_deref(), Some(std::path::Path::new("/var/log/proxy/audit.jsonl")));
        assert_eq!(config.audit.max_body_bytes, Some(1024 * 1024));
    }
}
