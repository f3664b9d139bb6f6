//! Response caching subsystem.
//!
//! # Data Flow
//! ```text
//! Relay handler
//!     → policy.rs (cache key, enabled?)
//!     → store.rs get(key) → hit: serve bytes
//!     → miss: fetch upstream
//!     → policy.rs is_cacheable(extension, length)
//!     → store.rs set(key, body, content type, ttl)
//! ```
//!
//! # Design Decisions
//! - The store is an owned component shared via `Arc`, never a global
//! - No single-flight: concurrent misses for one key all go upstream
//! - Expiration is lazy; there is no background sweep

pub mod policy;
pub mod store;

pub use policy::{extension_of, CachePolicy};
pub use store::{CachedResponse, ResponseCache};
