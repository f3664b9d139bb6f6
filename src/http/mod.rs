//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, relay state machine)
//!     → request.rs (request ID for log correlation)
//!     → [routing layer picks the prefix rule]
//!     → upstream.rs (fetch and buffer the target response)
//!     → response.rs (content type, cache headers)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;
pub mod upstream;

pub use request::X_REQUEST_ID;
pub use server::{AppState, GatewaySnapshot, HttpServer, ServerError};
