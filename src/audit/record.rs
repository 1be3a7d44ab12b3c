//! Audit record schema.
//!
//! One [`AuditRecord`] summarizes one exchange. Field names follow the
//! established line format consumed downstream:
//!
//! ```json
//! {"Id":"…","Timestamp":"…",
//!  "Request":{"Payload":"…","Protocol":"HTTP/1.1","Path":"/items","Url":"https://…/items","Method":"POST","Headers":{"Content-Type":["application/json"]}},
//!  "Response":{"Status_code":201,"Body":"…","Headers":{…},"Duration_ms":3}}
//! ```

use std::collections::BTreeMap;

use axum::http::{HeaderMap, StatusCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::BodyEncoding;
use crate::http::capture::CapturedBody;
use crate::http::interceptor::Exchange;

/// Header multimap, sorted by canonical header name.
pub type HeaderRecord = BTreeMap<String, Vec<String>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "Timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "Request")]
    pub request: RequestRecord,
    #[serde(rename = "Response")]
    pub response: ResponseRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestRecord {
    #[serde(rename = "Payload")]
    pub payload: String,
    #[serde(rename = "Protocol")]
    pub protocol: String,
    #[serde(rename = "Path")]
    pub path: String,
    #[serde(rename = "Url")]
    pub url: String,
    #[serde(rename = "Method")]
    pub method: String,
    #[serde(rename = "Headers")]
    pub headers: HeaderRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseRecord {
    #[serde(rename = "Status_code")]
    pub status_code: u16,
    #[serde(rename = "Body")]
    pub body: String,
    #[serde(rename = "Headers")]
    pub headers: HeaderRecord,
    #[serde(rename = "Duration_ms")]
    pub duration_ms: u64,
    /// Set only when no upstream response was obtained.
    #[serde(rename = "Error", default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AuditRecord {
    /// Record for an exchange that received an upstream response.
    pub fn new(
        exchange: &Exchange,
        status: StatusCode,
        headers: &HeaderMap,
        body: &CapturedBody,
        encoding: BodyEncoding,
    ) -> Self {
        Self {
            id: exchange.id.clone(),
            timestamp: exchange.started_at,
            request: RequestRecord::new(exchange, encoding),
            response: ResponseRecord {
                status_code: status.as_u16(),
                body: encoding.encode(body.bytes()),
                headers: header_record(headers),
                duration_ms: exchange.elapsed().as_millis() as u64,
                error: None,
            },
        }
    }

    /// Error-annotated record for an exchange whose upstream call failed.
    pub fn upstream_failure(
        exchange: &Exchange,
        status: StatusCode,
        error: &str,
        encoding: BodyEncoding,
    ) -> Self {
        Self {
            id: exchange.id.clone(),
            timestamp: exchange.started_at,
            request: RequestRecord::new(exchange, encoding),
            response: ResponseRecord {
                status_code: status.as_u16(),
                body: String::new(),
                headers: HeaderRecord::new(),
                duration_ms: exchange.elapsed().as_millis() as u64,
                error: Some(error.to_string()),
            },
        }
    }
}

impl RequestRecord {
    fn new(exchange: &Exchange, encoding: BodyEncoding) -> Self {
        Self {
            payload: encoding.encode(exchange.body.bytes()),
            protocol: format!("{:?}", exchange.version),
            path: exchange.path.clone(),
            url: exchange.url.to_string(),
            method: exchange.method.to_string(),
            headers: header_record(&exchange.headers),
        }
    }
}

/// Convert a header map into the record multimap. Repeated headers keep
/// their order; non-UTF-8 values are rendered lossily.
pub fn header_record(headers: &HeaderMap) -> HeaderRecord {
    let mut record = HeaderRecord::new();
    for (name, value) in headers {
        record
            .entry(canonical_header_name(name.as_str()))
            .or_default()
            .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
    }
    record
}

/// `content-type` → `Content-Type`, `x-request-id` → `X-Request-Id`.
pub fn canonical_header_name(name: &str) -> String {
    let mut canonical = String::with_capacity(name.len());
    let mut upper = true;
    for c in name.chars() {
        if upper {
            canonical.extend(c.to_uppercase());
        } else {
            canonical.extend(c.to_lowercase());
        }
        upper = c == '-';
    }
    canonical
}
