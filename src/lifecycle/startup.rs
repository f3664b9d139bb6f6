//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Log a startup banner describing the active rules and cache policy
//!
//! # Design Decisions
//! - Fail fast: an unreadable or invalid config file is fatal
//! - A missing config file is not an error; defaults apply with a warning

use std::io;
use std::path::{Path, PathBuf};

use crate::config::{load_config, ConfigError, GatewayConfig, ProxyRule};
use crate::routing::router::PATH_PLACEHOLDER;
use crate::units::format_size;

/// Where the active configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Defaults(PathBuf),
}

/// Load `path`, or fall back to defaults when the file does not exist.
///
/// Runs before logging is installed, so the outcome is returned for
/// [`log_banner`] to report.
pub fn load_or_default(path: &Path) -> Result<(GatewayConfig, ConfigSource), ConfigError> {
    match load_config(path) {
        Ok(config) => Ok((config, ConfigSource::File(path.to_path_buf()))),
        Err(ConfigError::Io(e)) if e.kind() == io::ErrorKind::NotFound => Ok((
            GatewayConfig::default(),
            ConfigSource::Defaults(path.to_path_buf()),
        )),
        Err(e) => Err(e),
    }
}

/// Log what the gateway is about to serve.
pub fn log_banner(config: &GatewayConfig, source: &ConfigSource) {
    match source {
        ConfigSource::File(path) => tracing::info!(path = ?path, "Configuration loaded"),
        ConfigSource::Defaults(path) => {
            tracing::warn!(path = ?path, "Config file not found, using defaults")
        }
    }
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        title = %config.site.title,
        "cdn-relay starting"
    );

    for rule in &config.proxies {
        tracing::info!(
            prefix = %rule.prefix,
            target = %rule.target,
            redirect = rule.raw_redirect.as_deref().unwrap_or("-"),
            visible = rule.visible,
            "Proxy rule"
        );
    }
    for rule in templates_without_placeholder(config) {
        tracing::warn!(
            prefix = %rule.prefix,
            template = rule.raw_redirect.as_deref().unwrap_or_default(),
            "Redirect template has no {{path}} placeholder; every redirect goes to the same URL"
        );
    }
    if config.proxies.is_empty() {
        tracing::warn!("No proxy rules configured; every relay request will 404");
    }

    let cache = &config.cache;
    if cache.enabled {
        tracing::info!(
            min_size = %describe_size(cache.min_size.bytes()),
            capacity = %describe_size(cache.capacity.bytes()),
            max_time = %cache.max_time,
            types = ?cache.image_types,
            "Response cache enabled"
        );
    } else {
        tracing::info!("Response cache disabled");
    }
}

/// Rules whose redirect template never receives the request path.
pub fn templates_without_placeholder(config: &GatewayConfig) -> impl Iterator<Item = &ProxyRule> {
    config.proxies.iter().filter(|rule| {
        rule.raw_redirect
            .as_deref()
            .is_some_and(|template| !template.contains(PATH_PLACEHOLDER))
    })
}

fn describe_size<E>(bytes: Result<u64, E>) -> String {
    bytes.map(format_size).unwrap_or_else(|_| "invalid".to_string())
}
