//! CDN relay gateway.
//!
//! ```text
//!     Client Request
//!     ──────────────▶ site endpoints ("/", "/favicon.ico", status path, "/logs")
//!                          │ (no match)
//!                          ▼
//!                     prefix router ──▶ ?raw ──▶ 302 Location
//!                          │
//!                          ▼
//!                     response cache ──▶ hit ──▶ 200 cached body
//!                          │ miss
//!                          ▼
//!                     upstream fetch ──▶ store if cacheable ──▶ 200 relayed body
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use cdn_relay::config::watcher::ConfigWatcher;
use cdn_relay::lifecycle::{signals, startup};
use cdn_relay::observability::{logging, metrics};
use cdn_relay::{HttpServer, LogBuffer, ResponseCache, Shutdown};

/// Path-prefix relay with an in-memory response cache.
#[derive(Debug, Parser)]
#[command(name = "cdn-relay", version, about)]
struct Args {
    /// Configuration file (TOML, or JSON with a .json extension)
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Reload the configuration file when it changes
    #[arg(short, long)]
    watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let (config, source) = startup::load_or_default(&args.config)?;

    let logs = LogBuffer::new(config.observability.log_buffer_lines);
    logging::init_logging(&config.observability.log_level, &logs)?;
    startup::log_banner(&config, &source);

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let capacity = config.cache.capacity.bytes()?;
    let cache = Arc::new(ResponseCache::new(capacity));
    let server = HttpServer::with_parts(config, cache, logs)?;

    // The watcher handle must outlive the server.
    let (_watcher, config_updates) = if args.watch {
        let (watcher, rx) = ConfigWatcher::new(&args.config);
        (Some(watcher.run()?), rx)
    } else {
        let (_tx, rx) = mpsc::unbounded_channel();
        (None, rx)
    };

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        signals::wait_for_shutdown().await;
        trigger.trigger();
    });

    server.run(listener, config_updates, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
