//! HTTP server setup and the per-request pipeline.
//!
//! # Responsibilities
//! - Create the Axum router with a single catch-all proxy handler
//! - Wire up middleware (tracing, request deadline)
//! - Capture the request body and build the exchange context
//! - Rewrite and forward to the origin
//! - Run the response interceptor before the client sees the response

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::ProxyConfig;
use crate::http::capture::capture;
use crate::http::interceptor::{Exchange, ResponseInterceptor};
use crate::http::request::request_id;
use crate::http::response::ExchangeFailure;
use crate::lifecycle::stopped;
use crate::observability::metrics;
use crate::upstream::{ForwardError, Forwarder, Origin};

/// Application state injected into the handler. Shared read-only by all
/// exchanges; nothing here changes after startup.
#[derive(Clone)]
pub struct AppState {
    pub forwarder: Arc<Forwarder>,
    pub interceptor: Arc<dyn ResponseInterceptor>,
    pub max_body_bytes: Option<usize>,
}

/// HTTP server for the intercepting proxy.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a server forwarding to `origin` and running `interceptor` on
    /// every upstream response.
    pub fn new(
        config: ProxyConfig,
        origin: Origin,
        interceptor: Arc<dyn ResponseInterceptor>,
    ) -> Result<Self, ForwardError> {
        let forwarder = Arc::new(Forwarder::new(origin, &config.timeouts)?);

        let state = AppState {
            forwarder,
            interceptor,
            max_body_bytes: config.audit.max_body_bytes,
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        Router::new()
            .fallback(proxy_handler)
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(TraceLayer::new_for_http())
    }

    /// Serve on `listener` until `shutdown` fires, then drain in-flight
    /// exchanges.
    pub async fn run(self, listener: TcpListener, shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                stopped(shutdown).await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Main proxy handler.
///
/// All per-exchange data lives in this invocation's locals and the
/// `Exchange` passed to the interceptor.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let started = Instant::now();
    let started_at = chrono::Utc::now();
    let id = request_id(request.headers());

    let (mut parts, body) = request.into_parts();
    let method = parts.method.clone();
    let path = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| "/".to_string());
    let version = parts.version;

    // 1. Capture request body
    let (payload, replay) = match capture(body, state.max_body_bytes).await {
        Ok(captured) => captured,
        Err(e) => {
            tracing::error!(
                request_id = %id,
                method = %method,
                path = %path,
                error = %e,
                "Failed to capture request body; exchange aborted"
            );
            metrics::record_capture_failure("request");
            let failure = ExchangeFailure::RequestCapture(e);
            metrics::record_exchange(method.as_str(), failure.status().as_u16(), started);
            return failure.into_response();
        }
    };

    // 2. Rewrite towards the origin
    state.forwarder.rewrite(&mut parts);

    let exchange = Exchange {
        id,
        started_at,
        started,
        method,
        path,
        version,
        url: parts.uri.clone(),
        headers: parts.headers.clone(),
        body: payload,
    };

    tracing::debug!(
        request_id = %exchange.id,
        method = %exchange.method,
        path = %exchange.path,
        upstream = %exchange.url,
        bytes = exchange.body.len(),
        "Proxying request"
    );

    // 3. Forward
    let response = match state.forwarder.forward(Request::from_parts(parts, replay)).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(
                request_id = %exchange.id,
                upstream = %exchange.url,
                error = %e,
                "Upstream error"
            );
            state.interceptor.on_upstream_error(&exchange, &e).await;
            metrics::record_exchange(exchange.method.as_str(), e.status().as_u16(), exchange.started);
            return ExchangeFailure::Forward(e).into_response();
        }
    };
    let status = response.status();

    // 4. Intercept before the client sees anything
    match state.interceptor.on_response(&exchange, response).await {
        Ok(response) => {
            tracing::debug!(
                request_id = %exchange.id,
                status = %status,
                elapsed_ms = exchange.elapsed().as_millis() as u64,
                "Exchange completed"
            );
            metrics::record_exchange(exchange.method.as_str(), status.as_u16(), exchange.started);
            response
        }
        Err(e) => {
            tracing::error!(
                request_id = %exchange.id,
                status = %status,
                error = %e,
                "Failed to capture response body; exchange aborted"
            );
            metrics::record_capture_failure("response");
            let failure = ExchangeFailure::Intercept(e);
            metrics::record_exchange(exchange.method.as_str(), failure.status().as_u16(), exchange.started);
            failure.into_response()
        }
    }
}
