//! Upstream origin resolution.
//!
//! The configured origin string is parsed once at startup into an
//! [`Origin`]; every exchange reads it, nothing writes it afterwards.

use axum::http::uri::{Authority, PathAndQuery, Scheme, Uri};
use thiserror::Error;
use url::Url;

/// The configured origin could not be turned into a scheme + host pair.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InvalidOriginError {
    #[error("origin is empty")]
    Empty,

    #[error("cannot parse origin '{origin}': {reason}")]
    Parse { origin: String, reason: String },

    #[error("origin '{0}' has no host")]
    MissingHost(String),

    #[error("unsupported origin scheme '{0}' (expected http or https)")]
    UnsupportedScheme(String),
}

/// Canonical upstream target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    scheme: Scheme,
    authority: Authority,
    base_path: String,
}

impl Origin {
    /// Parse an origin such as `https://api.internal` or `http://127.0.0.1:3000/v1`.
    pub fn resolve(origin: &str) -> Result<Self, InvalidOriginError> {
        let trimmed = origin.trim();
        if trimmed.is_empty() {
            return Err(InvalidOriginError::Empty);
        }

        let url = Url::parse(trimmed).map_err(|e| InvalidOriginError::Parse {
            origin: trimmed.to_string(),
            reason: e.to_string(),
        })?;

        let scheme = match url.scheme() {
            "http" => Scheme::HTTP,
            "https" => Scheme::HTTPS,
            other => return Err(InvalidOriginError::UnsupportedScheme(other.to_string())),
        };

        let host = match url.host_str() {
            Some(h) if !h.is_empty() => h,
            _ => return Err(InvalidOriginError::MissingHost(trimmed.to_string())),
        };
        let authority = match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };
        let authority: Authority = authority.parse().map_err(|e: axum::http::uri::InvalidUri| {
            InvalidOriginError::Parse {
                origin: trimmed.to_string(),
                reason: e.to_string(),
            }
        })?;

        let base_path = url.path().trim_end_matches('/').to_string();

        Ok(Self {
            scheme,
            authority,
            base_path,
        })
    }

    /// `http` or `https`.
    pub fn scheme(&self) -> &str {
        self.scheme.as_str()
    }

    /// Host with an explicit port when one was configured. This is the
    /// value written into the forwarded `Host` header.
    pub fn host(&self) -> &str {
        self.authority.as_str()
    }

    /// Path prefix joined in front of every forwarded path; empty for a bare origin.
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Build the absolute upstream URI for an inbound request target.
    /// The inbound path and query are kept as-is.
    pub fn target_uri(&self, inbound: &Uri) -> Uri {
        let path_and_query = inbound
            .path_and_query()
            .map(PathAndQuery::as_str)
            .unwrap_or("/");
        let joined = if self.base_path.is_empty() {
            path_and_query.to_string()
        } else if path_and_query.starts_with('/') {
            format!("{}{}", self.base_path, path_and_query)
        } else {
            format!("{}/{}", self.base_path, path_and_query)
        };

        let mut parts = axum::http::uri::Parts::default();
        parts.scheme = Some(self.scheme.clone());
        parts.authority = Some(self.authority.clone());
        parts.path_and_query = joined.parse().ok();
        Uri::from_parts(parts).unwrap_or_else(|_| inbound.clone())
    }
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}://{}{}", self.scheme, self.authority, self.base_path)
    }
}
