//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Parse every size/duration string once, at startup
//! - Check rule prefixes and target URLs
//! - Check listener and metrics addresses
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::GatewayConfig;
use crate::routing::PrefixRule;

/// Longest accepted `cache.max_time`: ten years.
pub const MAX_CACHE_TIME_SECS: u64 = 10 * 365 * 86_400;

/// A single semantic problem, tagged with the offending field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl fmt::Display) -> Self {
        Self {
            field: field.into(),
            message: message.to_string(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(e) = config.listener.bind_address.parse::<SocketAddr>() {
        errors.push(ValidationError::new("listener.bind_address", e));
    }
    if let Err(e) = config.listener.max_body_size.bytes() {
        errors.push(ValidationError::new("listener.max_body_size", e));
    }

    for (i, rule) in config.proxies.iter().enumerate() {
        if let Err(e) = PrefixRule::compile(rule) {
            errors.push(ValidationError::new(format!("proxies[{i}]"), e));
        }
    }

    let cache = &config.cache;
    if let Err(e) = cache.min_size.bytes() {
        errors.push(ValidationError::new("cache.min_size", e));
    }
    match cache.max_time.secs() {
        Ok(secs) if secs > MAX_CACHE_TIME_SECS => errors.push(ValidationError::new(
            "cache.max_time",
            format!("{secs}s exceeds the {MAX_CACHE_TIME_SECS}s maximum"),
        )),
        Ok(_) => {}
        Err(e) => errors.push(ValidationError::new("cache.max_time", e)),
    }
    match cache.capacity.bytes() {
        Ok(0) => errors.push(ValidationError::new("cache.capacity", "must be greater than zero")),
        Ok(_) => {}
        Err(e) => errors.push(ValidationError::new("cache.capacity", e)),
    }

    let status_path = config.site.status_path.as_str();
    if !status_path.starts_with('/') {
        errors.push(ValidationError::new("site.status_path", "must start with '/'"));
    } else if crate::site::is_reserved(status_path) {
        errors.push(ValidationError::new(
            "site.status_path",
            format!("'{status_path}' is already served by the gateway"),
        ));
    } else if !status_path
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '_' | '.' | '-'))
    {
        errors.push(ValidationError::new(
            "site.status_path",
            "may only contain letters, digits, '/', '_', '.' and '-'",
        ));
    }

    let obs = &config.observability;
    if obs.metrics_enabled {
        if let Err(e) = obs.metrics_address.parse::<SocketAddr>() {
            errors.push(ValidationError::new("observability.metrics_address", e));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::ProxyRule;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&GatewayConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = GatewayConfig::default();
        config.listener.bind_address = "not an address".into();
        config.proxies.push(ProxyRule::new("", "https://origin.example/"));
        config.proxies.push(ProxyRule::new("/ok", "https://origin.example/"));
        config.proxies.push(ProxyRule::new("/bad", "relative/path"));
        config.cache.min_size = "8 MB".into();
        config.cache.max_time = "1D".into();
        config.cache.capacity = "0B".into();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "listener.bind_address",
                "proxies[0]",
                "proxies[2]",
                "cache.min_size",
                "cache.max_time",
                "cache.capacity",
            ]
        );
    }

    #[test]
    fn test_metrics_address_checked_only_when_enabled() {
        let mut config = GatewayConfig::default();
        config.observability.metrics_address = "nowhere".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_status_path_must_not_shadow_fixed_routes() {
        let mut config = GatewayConfig::default();
        for path in ["/", "/favicon.ico", "/logs", "list", "/{id}", "/*rest"] {
            config.site.status_path = path.into();
            let errors = validate_config(&config).unwrap_err();
            assert_eq!(errors[0].field, "site.status_path", "{path}");
        }

        config.site.status_path = "/api/status.json".into();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_max_time_is_bounded() {
        let mut config = GatewayConfig::default();
        config.cache.max_time = "18446744073709551615S".into();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "cache.max_time");

        config.cache.max_time = format!("{}S", MAX_CACHE_TIME_SECS + 1).as_str().into();
        assert!(validate_config(&config).is_err());

        config.cache.max_time = format!("{MAX_CACHE_TIME_SECS}S").as_str().into();
        assert!(validate_config(&config).is_ok());
    }
}
