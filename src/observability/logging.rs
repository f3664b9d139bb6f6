//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Mirror events into the in-memory [`LogBuffer`]
//!
//! # Design Decisions
//! - `RUST_LOG` wins over the configured level
//! - Two `fmt` layers share one filter: ANSI stdout and plain buffer

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::observability::log_buffer::LogBuffer;

/// Build the default filter directive for a configured level.
pub fn default_directive(level: &str) -> String {
    format!("cdn_relay={level},tower_http={level}")
}

/// Install the global subscriber. Returns an error if one is already set.
pub fn init_logging(
    level: &str,
    buffer: &LogBuffer,
) -> Result<(), tracing_subscriber::util::TryInitError> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_directive(level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(buffer.clone()),
        )
        .try_init()
}
