//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.
//! Field aliases accept the camelCase names used by older JSON configs.

use serde::{Deserialize, Serialize};

use crate::units::{DurationValue, SizeValue};

/// Root configuration for the relay gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, body limits).
    pub listener: ListenerConfig,

    /// Presentation metadata and static assets.
    pub site: SiteConfig,

    /// Forwarding rules, evaluated in declared order.
    pub proxies: Vec<ProxyRule>,

    /// Response cache policy.
    pub cache: CacheConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,

    /// Largest inbound request body buffered for forwarding.
    pub max_body_size: SizeValue,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:3000".to_string(),
            max_body_size: "16MB".into(),
        }
    }
}

/// Site metadata shown on the status listing, plus static asset location.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SiteConfig {
    pub title: String,
    pub description: String,
    pub footer: String,

    /// Free-form establishment date, displayed as-is.
    #[serde(alias = "establishTime")]
    pub establish_time: Option<String>,

    /// Directory holding `index.html` and `favicon.ico`.
    pub public_dir: String,

    /// Path of the JSON status listing.
    pub status_path: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "CDN Relay".to_string(),
            description: "Multi-origin content relay".to_string(),
            footer: String::new(),
            establish_time: None,
            public_dir: "./public".to_string(),
            status_path: "/list".to_string(),
        }
    }
}

/// One forwarding rule.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ProxyRule {
    /// Literal path prefix selecting this rule.
    pub prefix: String,

    /// Absolute base URL the residual path is resolved against.
    pub target: String,

    /// Redirect template with a `{path}` placeholder, used in raw mode.
    #[serde(default, alias = "rawRedirect")]
    pub raw_redirect: Option<String>,

    /// Human-readable description for the status listing.
    #[serde(default)]
    pub description: Option<String>,

    /// Whether the status listing shows this rule.
    #[serde(default = "default_visible")]
    pub visible: bool,
}

fn default_visible() -> bool {
    true
}

impl ProxyRule {
    /// Shorthand used by tests and programmatic setups.
    pub fn new(prefix: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            target: target.into(),
            raw_redirect: None,
            description: None,
            visible: true,
        }
    }
}

/// Global cache policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Enable response caching.
    pub enabled: bool,

    /// Smallest response body worth caching.
    #[serde(alias = "minSize")]
    pub min_size: SizeValue,

    /// Entry lifetime; also the advertised `max-age`.
    #[serde(alias = "maxTime")]
    pub max_time: DurationValue,

    /// Cacheable file extensions, lowercase, without the dot.
    #[serde(alias = "imageTypes")]
    pub image_types: Vec<String>,

    /// Total bytes the cache may hold.
    pub capacity: SizeValue,

    /// Include the query string in the cache key.
    #[serde(alias = "keyIncludesQuery")]
    pub key_includes_query: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            min_size: "8MB".into(),
            max_time: "86400S".into(),
            image_types: ["png", "jpg", "jpeg", "gif", "svg", "webp", "bmp", "ico"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            capacity: "1024MB".into(),
            key_includes_query: false,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Lines retained for the recent-activity endpoint.
    pub log_buffer_lines: usize,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_buffer_lines: 2000,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
