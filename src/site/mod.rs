//! Operational endpoints served before any proxy rule.
//!
//! - `/`            home page from `<public_dir>/index.html`
//! - `/favicon.ico` icon from `<public_dir>/favicon.ico`
//! - status path    JSON listing of visible rules (default `/list`)
//! - `/logs`        recent log lines

pub mod handlers;

use std::fs;
use std::path::Path;

use axum::body::Bytes;

pub const HOME_PATH: &str = "/";
pub const FAVICON_PATH: &str = "/favicon.ico";
pub const LOGS_PATH: &str = "/logs";

/// Static files read once at startup. Missing files stay `None`.
#[derive(Debug, Clone, Default)]
pub struct SiteAssets {
    pub index: Option<Bytes>,
    pub favicon: Option<Bytes>,
}

impl SiteAssets {
    pub fn load(public_dir: &Path) -> Self {
        Self {
            index: read_asset(&public_dir.join("index.html")),
            favicon: read_asset(&public_dir.join("favicon.ico")),
        }
    }
}

fn read_asset(path: &Path) -> Option<Bytes> {
    match fs::read(path) {
        Ok(data) => Some(Bytes::from(data)),
        Err(e) => {
            tracing::warn!(path = ?path, error = %e, "Static asset unavailable");
            None
        }
    }
}

/// Whether `path` is taken by one of the fixed endpoints.
pub fn is_reserved(path: &str) -> bool {
    matches!(path, HOME_PATH | FAVICON_PATH | LOGS_PATH)
}
