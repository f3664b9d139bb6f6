//! CDN relay gateway library.
//!
//! Relays requests under configured path prefixes to upstream origins,
//! optionally redirecting instead, and keeps a bounded in-memory cache of
//! successful responses.

pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod site;
pub mod units;

pub use cache::{CachePolicy, ResponseCache};
pub use config::GatewayConfig;
pub use error::RelayError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use observability::LogBuffer;
