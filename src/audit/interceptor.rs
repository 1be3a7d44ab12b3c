//! The auditing response interceptor.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Response;

use crate::audit::record::AuditRecord;
use crate::audit::sink::{AuditError, AuditSink};
use crate::config::{AuditConfig, BodyEncoding};
use crate::http::capture::capture;
use crate::http::interceptor::{Exchange, InterceptError, ResponseInterceptor};
use crate::observability::metrics;
use crate::upstream::ForwardError;

/// Captures each upstream response body and emits one audit record per
/// exchange. Holds no per-exchange state.
#[derive(Clone, Debug)]
pub struct AuditInterceptor {
    sink: AuditSink,
    encoding: BodyEncoding,
    max_body_bytes: Option<usize>,
}

impl AuditInterceptor {
    pub fn new(sink: AuditSink, config: &AuditConfig) -> Self {
        Self {
            sink,
            encoding: config.body_encoding,
            max_body_bytes: config.max_body_bytes,
        }
    }

    fn emit(&self, exchange: &Exchange, record: &AuditRecord) {
        match self.sink.emit(record) {
            Ok(()) => metrics::record_audit("emitted"),
            Err(err @ AuditError::Serialize(_)) => {
                metrics::record_audit("failed");
                tracing::error!(request_id = %exchange.id, error = %err, "Audit record could not be encoded");
            }
            Err(err) => {
                metrics::record_audit("dropped");
                tracing::warn!(request_id = %exchange.id, error = %err, "Audit record dropped");
            }
        }
    }
}

#[async_trait]
impl ResponseInterceptor for AuditInterceptor {
    async fn on_response(
        &self,
        exchange: &Exchange,
        response: Response<Body>,
    ) -> Result<Response<Body>, InterceptError> {
        let (parts, body) = response.into_parts();
        let (captured, replay) = capture(body, self.max_body_bytes).await?;

        let record = AuditRecord::new(exchange, parts.status, &parts.headers, &captured, self.encoding);
        self.emit(exchange, &record);

        Ok(Response::from_parts(parts, replay))
    }

    async fn on_upstream_error(&self, exchange: &Exchange, error: &ForwardError) {
        let record = AuditRecord::upstream_failure(exchange, error.status(), &error.to_string(), self.encoding);
        self.emit(exchange, &record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::capture::{CaptureError, CapturedBody};
    use axum::http::{HeaderMap, Method, StatusCode, Version};
    use http_body_util::BodyExt;
    use std::time::{Duration, Instant};
    use tokio::io::{AsyncBufReadExt, BufReader};

    fn exchange(id: &str, payload: &'static [u8]) -> Exchange {
        Exchange {
            id: id.to_string(),
            started_at: chrono::Utc::now(),
            started: Instant::now(),
            method: Method::POST,
            path: "/items".into(),
            version: Version::HTTP_11,
            url: "http://127.0.0.1:3000/items".parse().unwrap(),
            headers: HeaderMap::new(),
            body: CapturedBody::new(payload),
        }
    }

    #[tokio::test]
    async fn test_response_passes_through_and_is_recorded() {
        let (writer, reader) = tokio::io::duplex(64 * 1024);
        let (sink, handle) = AuditSink::spawn(writer, 8);
        let interceptor = AuditInterceptor::new(sink, &AuditConfig::default());

        let response = Response::builder()
            .status(StatusCode::CREATED)
            .header("content-type", "application/json")
            .body(Body::from("{\"id\":7}"))
            .unwrap();

        let exchange = exchange("ex-1", b"{\"x\":1}");
        let response = interceptor.on_response(&exchange, response).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body.as_ref(), b"{\"id\":7}");

        drop(interceptor);
        handle.await.unwrap();

        let line = BufReader::new(reader).lines().next_line().await.unwrap().unwrap();
        let record: AuditRecord = serde_json::from_str(&line).unwrap();
        assert_eq!(record.id, "ex-1");
        assert_eq!(record.request.payload, "{\"x\":1}");
        assert_eq!(record.response.status_code, 201);
        assert_eq!(record.response.body, "{\"id\":7}");
    }

    #[tokio::test]
    async fn test_oversized_response_fails_without_record() {
        let (writer, reader) = tokio::io::duplex(64 * 1024);
        let (sink, handle) = AuditSink::spawn(writer, 8);
        let config = AuditConfig {
            max_body_bytes: Some(4),
            ..AuditConfig::default()
        };
        let interceptor = AuditInterceptor::new(sink, &config);

        let response = Response::new(Body::from("far too long"));
        let err = interceptor
            .on_response(&exchange("ex-2", b""), response)
            .await
            .unwrap_err();
        assert!(matches!(err, InterceptError::Capture(CaptureError::TooLarge { limit: 4 })));

        drop(interceptor);
        handle.await.unwrap();
        assert!(BufReader::new(reader).lines().next_line().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upstream_error_emits_annotated_record() {
        let (writer, reader) = tokio::io::duplex(64 * 1024);
        let (sink, handle) = AuditSink::spawn(writer, 8);
        let interceptor = AuditInterceptor::new(sink, &AuditConfig::default());

        let error = ForwardError::Timeout(Duration::from_secs(10));
        interceptor.on_upstream_error(&exchange("ex-3", b"abc"), &error).await;

        drop(interceptor);
        handle.await.unwrap();

        let line = BufReader::new(reader).lines().next_line().await.unwrap().unwrap();
        let record: AuditRecord = serde_json::from_str(&line).unwrap();
        assert_eq!(record.response.status_code, 504);
        assert!(record.response.error.unwrap().contains("did not respond"));
        assert_eq!(record.request.payload, "abc");
    }
}
