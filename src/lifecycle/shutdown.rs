//! Shutdown coordination for the gateway.
//!
//! `main` hands one receiver to [`HttpServer::run`](crate::http::HttpServer::run)
//! and triggers from the signal task. The server then stops accepting,
//! lets in-flight relays finish, and stops its reload task. Cached
//! responses live in memory only and are dropped with the process.

use tokio::sync::broadcast;

/// Broadcast handle: every subscriber sees a single `trigger`.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Number of live receivers, i.e. servers not yet stopped.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
