//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path, query)
//!     → router.rs (first rule whose prefix matches)
//!     → matcher.rs (strip prefix, sanitize residual)
//!     → Return: RouteMatch or NoMatch
//!
//! Route Compilation (at startup and on reload):
//!     ProxyRule[]
//!     → Parse target URLs
//!     → Freeze as immutable Router
//! ```
//!
//! # Design Decisions
//! - Rules compiled once, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same input always matches same rule
//! - First match wins (declared order)

pub mod matcher;
pub mod router;

pub use matcher::{sanitize_path, PrefixRule, RouteError};
pub use router::{is_raw_request, parse_query, RouteMatch, Router};
