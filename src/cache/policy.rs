//! Cacheability decisions and cache-key derivation.
//!
//! # Responsibilities
//! - Decide whether a fetched body may be stored (extension + size)
//! - Derive the cache key for an inbound request
//! - Derive the file extension of an upstream URL
//!
//! # Design Decisions
//! - Policy is global; rules cannot override it
//! - Config strings are parsed once here, never per request
//! - Keys are path-only unless `key_includes_query` is set, so responses
//!   that vary by query string share one slot by default

use std::collections::HashSet;
use std::time::Duration;

use axum::http::Uri;
use url::Url;

use crate::config::schema::CacheConfig;
use crate::units::UnitError;

/// Parsed, immutable cache policy.
#[derive(Debug, Clone)]
pub struct CachePolicy {
    enabled: bool,
    min_size: u64,
    ttl: Duration,
    types: HashSet<String>,
    key_includes_query: bool,
}

impl CachePolicy {
    /// Build a policy from configuration, parsing size and duration strings.
    pub fn from_config(config: &CacheConfig) -> Result<Self, UnitError> {
        Ok(Self {
            enabled: config.enabled,
            min_size: config.min_size.bytes()?,
            ttl: config.max_time.duration()?,
            types: config.image_types.iter().map(|t| t.to_lowercase()).collect(),
            key_includes_query: config.key_includes_query,
        })
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Lifetime given to stored entries.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn min_size(&self) -> u64 {
        self.min_size
    }

    /// True iff the extension is allow-listed and the body is large enough.
    pub fn is_cacheable(&self, extension: &str, byte_length: u64) -> bool {
        self.types.contains(&extension.to_lowercase()) && byte_length >= self.min_size
    }

    /// Cache key for an inbound request URI.
    pub fn cache_key(&self, uri: &Uri) -> String {
        match uri.query() {
            Some(query) if self.key_includes_query => format!("{}?{}", uri.path(), query),
            _ => uri.path().to_string(),
        }
    }
}

/// Lowercased text after the last `.` of the URL path, or empty if none.
pub fn extension_of(url: &Url) -> String {
    url.path()
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(min_size: &str, types: &[&str]) -> CachePolicy {
        let config = CacheConfig {
            enabled: true,
            min_size: min_size.into(),
            image_types: types.iter().map(|s| s.to_string()).collect(),
            ..CacheConfig::default()
        };
        CachePolicy::from_config(&config).unwrap()
    }

    #[test]
    fn test_requires_type_and_size() {
        let p = policy("1KB", &["png"]);
        assert!(p.is_cacheable("png", 2048));
        assert!(p.is_cacheable("png", 1024)); // Inclusive threshold
        assert!(!p.is_cacheable("png", 1023));
        assert!(!p.is_cacheable("jpg", 4096));
        assert!(p.is_cacheable("PNG", 2048));
    }

    #[test]
    fn test_empty_extension_only_when_listed() {
        assert!(!policy("0B", &["png"]).is_cacheable("", 10));
        assert!(policy("0B", &["png", ""]).is_cacheable("", 10));
    }

    #[test]
    fn test_defaults() {
        let p = CachePolicy::from_config(&CacheConfig::default()).unwrap();
        assert!(!p.enabled());
        assert_eq!(p.min_size(), 8 * 1024 * 1024);
        assert_eq!(p.ttl(), Duration::from_secs(86400));
        for ext in ["png", "jpg", "jpeg", "gif", "svg", "webp", "bmp", "ico"] {
            assert!(p.is_cacheable(ext, 8 * 1024 * 1024));
        }
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = CacheConfig {
            max_time: "1 day".into(),
            ..CacheConfig::default()
        };
        assert!(CachePolicy::from_config(&config).is_err());
    }

    #[test]
    fn test_extension_of() {
        let ext = |s: &str| extension_of(&Url::parse(s).unwrap());
        assert_eq!(ext("https://origin.example/photo.PNG"), "png");
        assert_eq!(ext("https://origin.example/a.b/photo.tar.gz"), "gz");
        assert_eq!(ext("https://origin.example/a.b/photo"), "b/photo");
        assert_eq!(ext("https://origin.example/photo"), "");
        assert_eq!(ext("https://origin.example/photo.png?x=a.jpg"), "png");
    }

    #[test]
    fn test_cache_key_ignores_query_by_default() {
        let uri: Uri = "/img/a.png?w=200".parse().unwrap();
        assert_eq!(policy("0B", &[]).cache_key(&uri), "/img/a.png");

        let mut p = policy("0B", &[]);
        p.key_includes_query = true;
        assert_eq!(p.cache_key(&uri), "/img/a.png?w=200");
        assert_eq!(p.cache_key(&"/img/a.png".parse().unwrap()), "/img/a.png");
    }
}
