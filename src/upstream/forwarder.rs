//! Single-upstream forwarding engine.
//!
//! Dials the origin, sends the (already rewritten) request and hands the
//! upstream response back. It knows nothing about auditing; the pipeline
//! wraps it with the interception hook.

use std::time::Duration;

use axum::body::Body;
use axum::http::{header::HOST, request, HeaderValue, Request, Response, StatusCode, Version};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use thiserror::Error;

use crate::config::TimeoutConfig;
use crate::upstream::headers::strip_hop_by_hop;
use crate::upstream::Origin;

/// HTTP client used for upstream calls (plain HTTP or TLS).
pub type UpstreamClient = Client<HttpsConnector<HttpConnector>, Body>;

/// Failures of the forwarding engine.
#[derive(Debug, Error)]
pub enum ForwardError {
    /// The TLS client configuration could not be built.
    #[error("failed to build TLS connector: {0}")]
    Tls(#[from] rustls::Error),

    /// Connecting to or talking to the upstream failed.
    #[error("upstream request failed: {0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),

    /// The upstream did not answer in time.
    #[error("upstream did not respond within {0:?}")]
    Timeout(Duration),
}

impl ForwardError {
    /// Gateway status reported to the client for this failure.
    pub fn status(&self) -> StatusCode {
        match self {
            ForwardError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::BAD_GATEWAY,
        }
    }
}

/// Forwards requests to one [`Origin`].
#[derive(Clone)]
pub struct Forwarder {
    client: UpstreamClient,
    origin: Origin,
    upstream_timeout: Duration,
}

impl Forwarder {
    /// Build the engine with connection and response deadlines from config.
    pub fn new(origin: Origin, timeouts: &TimeoutConfig) -> Result<Self, ForwardError> {
        let mut http_connector = HttpConnector::new();
        http_connector.enforce_http(false);
        http_connector.set_nodelay(true);
        http_connector.set_connect_timeout(Some(Duration::from_secs(timeouts.connect_secs)));

        let https_connector = HttpsConnectorBuilder::new()
            .with_provider_and_webpki_roots(rustls::crypto::ring::default_provider())?
            .https_or_http()
            .enable_http1()
            .enable_http2()
            .wrap_connector(http_connector);

        let client = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(Duration::from_secs(90))
            .build(https_connector);

        Ok(Self {
            client,
            origin,
            upstream_timeout: Duration::from_secs(timeouts.upstream_secs),
        })
    }

    /// Point the request at the origin: absolute URI, `Host` header set to
    /// the origin host, hop-by-hop headers removed.
    pub fn rewrite(&self, parts: &mut request::Parts) {
        parts.uri = self.origin.target_uri(&parts.uri);
        // The client negotiates the upstream protocol itself.
        parts.version = Version::HTTP_11;
        strip_hop_by_hop(&mut parts.headers);
        if let Ok(host) = HeaderValue::from_str(self.origin.host()) {
            parts.headers.insert(HOST, host);
        }
    }

    /// Send a rewritten request and wait for the upstream's response head.
    pub async fn forward(&self, request: Request<Body>) -> Result<Response<Body>, ForwardError> {
        let response = tokio::time::timeout(self.upstream_timeout, self.client.request(request))
            .await
            .map_err(|_| ForwardError::Timeout(self.upstream_timeout))??;

        let (mut parts, body) = response.into_parts();
        strip_hop_by_hop(&mut parts.headers);
        Ok(Response::from_parts(parts, Body::new(body)))
    }
}
