//! Response construction.
//!
//! # Responsibilities
//! - Build `Cache-Control` / `CDN-Cache-Control` from the configured max-age
//! - Build 200 responses carrying a body, its content type and cache headers
//!
//! # Design Decisions
//! - Header values are rendered once per config snapshot, not per request
//! - Only successful bodies get cache headers; errors and redirects do not

use axum::body::{Body, Bytes};
use axum::http::header::{HeaderMap, HeaderName, HeaderValue, CACHE_CONTROL, CONTENT_TYPE};
use axum::response::Response;

/// `CDN-Cache-Control` (RFC 9213) is not in the `http` constants.
pub static CDN_CACHE_CONTROL: HeaderName = HeaderName::from_static("cdn-cache-control");

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Pre-rendered cache header values.
#[derive(Debug, Clone)]
pub struct CacheHeaders {
    max_age: u64,
    cache_control: HeaderValue,
    cdn_cache_control: HeaderValue,
}

impl CacheHeaders {
    pub fn new(max_age: u64) -> Self {
        Self {
            max_age,
            cache_control: HeaderValue::from_str(&format!("public, max-age={max_age}"))
                .expect("digits are a valid header value"),
            cdn_cache_control: HeaderValue::from_str(&format!("max-age={max_age}"))
                .expect("digits are a valid header value"),
        }
    }

    /// Advertised max-age in seconds.
    pub fn max_age(&self) -> u64 {
        self.max_age
    }

    /// Set both headers, replacing any existing values.
    pub fn apply(&self, headers: &mut HeaderMap) {
        headers.insert(CACHE_CONTROL, self.cache_control.clone());
        headers.insert(CDN_CACHE_CONTROL.clone(), self.cdn_cache_control.clone());
    }
}

/// A 200 response with `body`, its content type and the cache headers.
pub fn body_response(content_type: &str, body: impl Into<Bytes>, cache: &CacheHeaders) -> Response {
    let mut response = Response::new(Body::from(body.into()));
    let content_type = HeaderValue::from_str(content_type)
        .unwrap_or_else(|_| HeaderValue::from_static(FALLBACK_CONTENT_TYPE));
    response.headers_mut().insert(CONTENT_TYPE, content_type);
    cache.apply(response.headers_mut());
    response
}
