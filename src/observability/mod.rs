//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events → stdout)
//!     → log_buffer.rs (same events, last N lines in memory)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → /logs endpoint (log buffer)
//!     → Metrics endpoint (Prometheus scrape)
//! ```

pub mod log_buffer;
pub mod logging;
pub mod metrics;

pub use log_buffer::LogBuffer;
