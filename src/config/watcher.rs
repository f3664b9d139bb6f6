//! Hot reload of the gateway configuration file.
//!
//! # Responsibilities
//! - Watch the config file passed with `--watch`
//! - Re-load and validate it on every modify/create event
//! - Hand accepted configs to the server, which swaps its rule table,
//!   cache policy and header values and then empties the response cache
//!
//! # Design Decisions
//! - A file that fails to load or validate is logged and dropped; the
//!   running configuration stays in place
//! - The watcher only produces configs; applying them is the server's job

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::{load_config, ConfigError};
use crate::config::schema::GatewayConfig;

const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Sends a freshly validated [`GatewayConfig`] whenever the file changes.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<GatewayConfig>,
}

impl ConfigWatcher {
    /// Returns the watcher and the receiving end to pass to
    /// [`HttpServer::run`](crate::http::HttpServer::run).
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<GatewayConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let watcher = Self {
            path: path.to_path_buf(),
            update_tx,
        };
        (watcher, update_rx)
    }

    /// Start watching. Dropping the returned handle stops the watch.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let Self { path, update_tx } = self;
        let watched = path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                    if let Err(e) = reload(&path, &update_tx) {
                        tracing::error!(
                            path = ?path,
                            error = %e,
                            "Config reload rejected, keeping current rules and cache"
                        );
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = ?e, "Config watch error"),
            },
            Config::default().with_poll_interval(POLL_INTERVAL),
        )?;

        watcher.watch(&watched, RecursiveMode::NonRecursive)?;
        tracing::info!(path = ?watched, "Watching config file for changes");
        Ok(watcher)
    }
}

/// Load `path` and queue it for the server. Returns the load error, if
/// any, without sending anything.
pub fn reload(
    path: &Path,
    update_tx: &mpsc::UnboundedSender<GatewayConfig>,
) -> Result<(), ConfigError> {
    let config = load_config(path)?;
    tracing::info!(
        path = ?path,
        rules = config.proxies.len(),
        cache_enabled = config.cache.enabled,
        "Config file changed, queueing reload"
    );
    if update_tx.send(config).is_err() {
        tracing::debug!("Server stopped, dropping reloaded config");
    }
    Ok(())
}
