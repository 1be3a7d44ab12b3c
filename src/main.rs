//! Intercepting audit reverse proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                              ┌──────────────────────────────────────────────────┐
//!                              │                 INTERCEPT PROXY                  │
//!                              │                                                  │
//!     Client Request           │  ┌─────────┐    ┌─────────┐    ┌────────────┐    │
//!     ─────────────────────────┼─▶│  http   │───▶│ capture │───▶│  upstream  │────┼──── Origin
//!                              │  │ server  │    │ request │    │ forwarder  │    │
//!                              │  └─────────┘    └─────────┘    └─────┬──────┘    │
//!                              │                                      │           │
//!                              │                                      ▼           │
//!     Client Response          │  ┌─────────┐    ┌──────────────────────────┐     │
//!     ◀────────────────────────┼──│ replay  │◀───│ audit interceptor        │     │
//!                              │  │  body   │    │ (capture, record, emit)  │     │
//!                              │  └─────────┘    └────────────┬─────────────┘     │
//!                              │                              │                   │
//!                              │                              ▼                   │
//!                              │                     ┌────────────────┐           │
//!                              │                     │  audit writer  │───────────┼──── stdout / file
//!                              │                     └────────────────┘           │
//!                              │  ┌────────────────────────────────────────────┐  │
//!                              │  │  config · observability · lifecycle        │  │
//!                              │  └────────────────────────────────────────────┘  │
//!                              └──────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use intercept_proxy::cli::Cli;
use intercept_proxy::observability::{logging, metrics};
use intercept_proxy::{AuditInterceptor, AuditSink, HttpServer, Origin, Shutdown};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match cli.load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("intercept-proxy: {}", e);
            return ExitCode::from(2);
        }
    };

    logging::init_logging(&config.observability);

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Fatal error");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: intercept_proxy::ProxyConfig) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("intercept-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    let origin = Origin::resolve(&config.upstream.origin)?;

    tracing::info!(
        bind_address = %config.listener.bind_address,
        origin = %origin,
        sink = ?config.audit.sink,
        body_encoding = ?config.audit.body_encoding,
        request_timeout_secs = config.timeouts.request_secs,
        upstream_timeout_secs = config.timeouts.upstream_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let (sink, writer) = AuditSink::from_config(&config.audit).await?;
    let interceptor = AuditInterceptor::new(sink, &config.audit);

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        "Listening for connections"
    );

    let server = HttpServer::new(config, origin, Arc::new(interceptor))?;

    let shutdown = Shutdown::new();
    shutdown.trigger_on_signal();
    server.run(listener, shutdown.subscribe()).await?;

    // The server held the last sink handle; the writer drains and exits.
    if let Err(e) = writer.await {
        tracing::error!(error = %e, "Audit writer task failed");
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
