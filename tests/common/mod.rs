//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Method, Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use intercept_proxy::config::ProxyConfig;
use intercept_proxy::{AuditInterceptor, AuditSink, HttpServer, Origin, Shutdown};

/// What a mock backend saw for one request.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Start a raw TCP backend that answers every connection with a fixed
/// response and closes it.
pub async fn start_mock_backend(status_line: &'static str, body: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let mut buf = [0u8; 4096];
                        let _ = tokio::io::AsyncReadExt::read(&mut socket, &mut buf).await;
                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_line,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Start a programmable backend; `f` sees each request and builds the
/// response.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(SeenRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response<Body>> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    let app = Router::new().fallback(move |request: Request<Body>| {
        let f = f.clone();
        async move {
            let (parts, body) = request.into_parts();
            let body = body.collect().await.unwrap().to_bytes();
            let seen = SeenRequest {
                method: parts.method,
                path: parts
                    .uri
                    .path_and_query()
                    .map(|pq| pq.as_str().to_string())
                    .unwrap_or_default(),
                headers: parts.headers,
                body,
            };
            f(seen).await
        }
    });

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    addr
}

/// Backend that echoes the request body and reports the `Host` it saw in
/// `X-Seen-Host`.
pub async fn start_echo_backend() -> SocketAddr {
    start_programmable_backend(|seen| async move {
        let host = seen
            .headers
            .get("host")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        Response::builder()
            .status(StatusCode::OK)
            .header("x-seen-host", host)
            .header("x-seen-path", seen.path)
            .body(Body::from(seen.body))
            .unwrap()
    })
    .await
}

/// A running proxy whose audit stream is readable from the test.
pub struct TestProxy {
    pub addr: SocketAddr,
    shutdown: Shutdown,
    server: JoinHandle<()>,
    writer: JoinHandle<()>,
    records: Lines<BufReader<DuplexStream>>,
}

impl TestProxy {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Next audit record, failing the test if none arrives in time.
    pub async fn next_record(&mut self) -> Value {
        let line = tokio::time::timeout(Duration::from_secs(5), self.records.next_line())
            .await
            .expect("audit record not written in time")
            .unwrap()
            .expect("audit stream closed");
        serde_json::from_str(&line).expect("audit line is not JSON")
    }

    /// Stop the proxy and wait for the audit writer to drain.
    pub async fn stop(mut self) -> Vec<Value> {
        self.shutdown.trigger();
        self.server.await.unwrap();
        self.writer.await.unwrap();

        let mut rest = Vec::new();
        while let Ok(Some(line)) = self.records.next_line().await {
            rest.push(serde_json::from_str(&line).unwrap());
        }
        rest
    }
}

/// Start a proxy in front of `origin` with default settings.
pub async fn start_proxy(origin: &str) -> TestProxy {
    start_proxy_with(origin, |_| {}).await
}

/// Start a proxy in front of `origin`, adjusting the config first.
pub async fn start_proxy_with(origin: &str, adjust: impl FnOnce(&mut ProxyConfig)) -> TestProxy {
    let mut config = ProxyConfig::default();
    config.upstream.origin = origin.to_string();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.timeouts.connect_secs = 2;
    config.timeouts.upstream_secs = 5;
    adjust(&mut config);

    let (audit_writer, audit_reader) = tokio::io::duplex(8 * 1024 * 1024);
    let (sink, writer) = AuditSink::spawn(audit_writer, config.audit.channel_capacity);
    let interceptor = AuditInterceptor::new(sink, &config.audit);

    let origin = Origin::resolve(&config.upstream.origin).unwrap();
    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = HttpServer::new(config, origin, Arc::new(interceptor)).unwrap();
    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    let server = tokio::spawn(async move {
        server.run(listener, rx).await.unwrap();
    });

    TestProxy {
        addr,
        shutdown,
        server,
        writer,
        records: BufReader::new(audit_reader).lines(),
    }
}

/// HTTP client that never routes through an environment proxy.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

/// A port with nothing listening on it.
pub fn closed_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}
