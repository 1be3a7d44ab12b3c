//! Command-line interface.
//!
//! Flags override whatever the optional TOML file says; anything left
//! unset keeps the file's value or the built-in default.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

use crate::config::{
    read_config, validate_config, AuditSinkKind, BodyEncoding, ConfigError, LogFormat, ProxyConfig,
};

#[derive(Debug, Parser)]
#[command(name = "intercept-proxy")]
#[command(version, about = "Reverse proxy that writes an audit record of every exchange", long_about = None)]
pub struct Cli {
    /// Upstream origin every request is forwarded to [default: https://example.com]
    #[arg(long, value_name = "URL")]
    pub host: Option<String>,

    /// Port to listen on [default: 8080]
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Full listen address, e.g. 127.0.0.1:8080 (takes precedence over --port)
    #[arg(long, value_name = "ADDR")]
    pub bind: Option<String>,

    /// TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// How captured bodies are written into audit records
    #[arg(long, value_enum)]
    pub body_encoding: Option<BodyEncoding>,

    /// Diagnostic log format
    #[arg(long, value_enum)]
    pub log_format: Option<LogFormat>,

    /// Append audit records to this file instead of stdout
    #[arg(long, value_name = "FILE")]
    pub audit_file: Option<PathBuf>,
}

impl Cli {
    /// Apply the flags that were given on top of `config`.
    pub fn apply(&self, config: &mut ProxyConfig) {
        if let Some(host) = &self.host {
            config.upstream.origin = host.clone();
        }

        if let Some(bind) = &self.bind {
            config.listener.bind_address = bind.clone();
        } else if let Some(port) = self.port {
            config.listener.bind_address = with_port(&config.listener.bind_address, port);
        }

        if let Some(encoding) = self.body_encoding {
            config.audit.body_encoding = encoding;
        }
        if let Some(format) = self.log_format {
            config.observability.log_format = format;
        }
        if let Some(path) = &self.audit_file {
            config.audit.sink = AuditSinkKind::File;
            config.audit.path = Some(path.clone());
        }
    }

    /// Build the final configuration: defaults, then `--config`, then flags,
    /// then validation.
    pub fn load(&self) -> Result<ProxyConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => read_config(path)?,
            None => ProxyConfig::default(),
        };
        self.apply(&mut config);
        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

/// Replace the port of `bind_address`, keeping its IP. Anything that is
/// not a socket address falls back to all interfaces.
fn with_port(bind_address: &str, port: u16) -> String {
    match bind_address.parse::<SocketAddr>() {
        Ok(mut addr) => {
            addr.set_port(port);
            addr.to_string()
        }
        Err(_) => SocketAddr::from(([0, 0, 0, 0], port)).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["intercept-proxy"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults_without_flags() {
        let config = parse(&[]).load().unwrap();
        assert_eq!(config.upstream.origin, "https://example.com");
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.audit.sink, AuditSinkKind::Stdout);
    }

    #[test]
    fn test_host_and_port_override() {
        let config = parse(&["--host", "http://api.internal:9000", "--port", "9999"])
            .load()
            .unwrap();
        assert_eq!(config.upstream.origin, "http://api.internal:9000");
        assert_eq!(config.listener.bind_address, "0.0.0.0:9999");
    }

    #[test]
    fn test_bind_wins_over_port() {
        let config = parse(&["--bind", "127.0.0.1:7000", "--port", "9999"])
            .load()
            .unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:7000");
    }

    #[test]
    fn test_port_keeps_file_host() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(
            &mut file,
            b"[listener]\nbind_address = \"127.0.0.1:8080\"\n[upstream]\norigin = \"http://from-file\"\n",
        )
        .unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let config = parse(&["--config", &path, "--port", "8181"]).load().unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:8181");
        assert_eq!(config.upstream.origin, "http://from-file");
    }

    #[test]
    fn test_audit_file_selects_file_sink() {
        let config = parse(&["--audit-file", "/tmp/audit.jsonl", "--body-encoding", "base64"])
            .load()
            .unwrap();
        assert_eq!(config.audit.sink, AuditSinkKind::File);
        assert_eq!(config.audit.path, Some(PathBuf::from("/tmp/audit.jsonl")));
        assert_eq!(config.audit.body_encoding, BodyEncoding::Base64);
    }

    #[test]
    fn test_invalid_host_fails_validation() {
        let err = parse(&["--host", "ftp://example.com"]).load().unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_port_override_always_yields_valid_bind_address() {
        assert_eq!(with_port("[::1]:8080", 1234), "[::1]:1234");
        assert_eq!(with_port("localhost:8080", 1234), "0.0.0.0:1234");
        assert_eq!(with_port("garbage", 1234), "0.0.0.0:1234");

        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"[listener]\nbind_address = \"localhost:8080\"\n").unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let config = parse(&["--config", &path, "--port", "1234"]).load().unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:1234");
    }
}
