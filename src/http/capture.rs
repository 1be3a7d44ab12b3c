//! Body capture.
//!
//! Reads a request or response body fully into memory and hands back a
//! fresh body over the same bytes, so the message can still be forwarded
//! as if nothing had read it.
//!
//! Bodies are buffered whole. Without `audit.max_body_bytes` the only
//! bound is available memory; with it, oversized bodies are rejected,
//! never truncated.

use std::convert::Infallible;

use axum::body::Body;
use axum::http::HeaderMap;
use bytes::Bytes;
use futures_util::stream;
use http_body_util::{BodyExt, LengthLimitError, Limited, StreamBody};
use hyper::body::{Body as HttpBody, Frame};
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failure while materializing a body.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The underlying transport failed mid-read (client went away,
    /// truncated chunked encoding, upstream reset).
    #[error("failed to read body: {0}")]
    Read(#[source] BoxError),

    /// The body exceeded the configured capture limit.
    #[error("body exceeds capture limit of {limit} bytes")]
    TooLarge { limit: usize },
}

/// Fully materialized body contents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedBody {
    bytes: Bytes,
    trailers: Option<HeaderMap>,
}

impl CapturedBody {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self {
            bytes: bytes.into(),
            trailers: None,
        }
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn trailers(&self) -> Option<&HeaderMap> {
        self.trailers.as_ref()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// A new body positioned at the start of the captured bytes, followed
    /// by the captured trailers if there were any. Every call returns an
    /// independent body.
    pub fn replay(&self) -> Body {
        match &self.trailers {
            None => Body::from(self.bytes.clone()),
            Some(trailers) => {
                let frames: Vec<Result<Frame<Bytes>, Infallible>> = vec![
                    Ok(Frame::data(self.bytes.clone())),
                    Ok(Frame::trailers(trailers.clone())),
                ];
                Body::new(StreamBody::new(stream::iter(frames)))
            }
        }
    }
}

/// Read `body` to the end, returning its contents and a replacement body.
///
/// The original body is consumed. `limit`, when set, caps the number of
/// bytes accepted.
pub async fn capture<B>(body: B, limit: Option<usize>) -> Result<(CapturedBody, Body), CaptureError>
where
    B: HttpBody<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError>,
{
    let body = Body::new(body);

    let collected = match limit {
        Some(limit) => Limited::new(body, limit).collect().await.map_err(|err| {
            if err.is::<LengthLimitError>() {
                CaptureError::TooLarge { limit }
            } else {
                CaptureError::Read(err)
            }
        })?,
        None => body
            .collect()
            .await
            .map_err(|err| CaptureError::Read(err.into()))?,
    };

    let trailers = collected.trailers().cloned();
    let captured = CapturedBody {
        bytes: collected.to_bytes(),
        trailers,
    };
    let replacement = captured.replay();
    Ok((captured, replacement))
}
