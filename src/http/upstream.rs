//! Upstream fetch.
//!
//! # Responsibilities
//! - Forward method, headers (minus `Host`) and body to the target URL
//! - Buffer the full upstream body in memory
//! - Turn non-success statuses into [`RelayError::Upstream`], keeping the
//!   upstream's status text
//!
//! # Design Decisions
//! - Exactly one attempt; no retries, no caller timeout
//! - `Accept-Encoding` is withheld so the buffered body is identity-encoded
//!   and can be served without `Content-Encoding`
//! - Framing headers are dropped; the client re-frames the buffered body

use axum::body::Bytes;
use axum::http::header::{
    HeaderMap, HeaderName, ACCEPT_ENCODING, CONNECTION, CONTENT_LENGTH, CONTENT_TYPE, HOST,
    TRANSFER_ENCODING,
};
use axum::http::{Extensions, Method, StatusCode};
use hyper::ext::ReasonPhrase;
use url::Url;

use crate::error::RelayError;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Inbound headers never copied to the upstream request.
const WITHHELD_HEADERS: [HeaderName; 5] = [
    HOST,
    ACCEPT_ENCODING,
    CONNECTION,
    CONTENT_LENGTH,
    TRANSFER_ENCODING,
];

/// An outbound request to an upstream target.
#[derive(Debug)]
pub struct UpstreamRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

/// A fully buffered successful upstream response.
#[derive(Debug)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub content_type: String,
    pub body: Bytes,
}

/// Shared HTTP client for upstream fetches.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: reqwest::Client,
}

impl UpstreamClient {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("cdn-relay/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    /// Issue a single request and buffer the response body.
    pub async fn fetch(&self, request: UpstreamRequest) -> Result<UpstreamResponse, RelayError> {
        tracing::debug!(method = %request.method, url = %request.url, "Fetching upstream");

        let mut builder = self
            .client
            .request(request.method, request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let reason = reason_phrase(status, response.extensions());
            return Err(RelayError::Upstream { status, reason });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();
        let body = response.bytes().await?;

        Ok(UpstreamResponse {
            status,
            content_type,
            body,
        })
    }
}

/// Status text as sent by the upstream. hyper only records a phrase that
/// differs from the canonical one, so fall back to the canonical reason.
pub fn reason_phrase(status: StatusCode, extensions: &Extensions) -> String {
    match extensions.get::<ReasonPhrase>() {
        Some(phrase) => String::from_utf8_lossy(phrase.as_bytes()).into_owned(),
        None => status.canonical_reason().unwrap_or_default().to_string(),
    }
}

/// Whether the inbound body is forwarded for `method`.
pub fn forwards_body(method: &Method) -> bool {
    *method != Method::GET && *method != Method::HEAD
}

/// Copy inbound headers for the upstream request, minus `Host`,
/// `Accept-Encoding` and framing headers.
pub fn forward_headers(inbound: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(inbound.len());
    for (name, value) in inbound {
        if !WITHHELD_HEADERS.contains(name) {
            headers.append(name.clone(), value.clone());
        }
    }
    headers
}
