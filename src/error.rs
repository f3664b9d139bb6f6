//! Request-time error taxonomy.
//!
//! Every variant is terminal for the request; nothing is retried.

use std::error::Error as _;

use axum::http::StatusCode;
use http_body_util::LengthLimitError;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Errors that end a relayed request.
#[derive(Debug, Error)]
pub enum RelayError {
    /// No configured prefix matches the request path.
    #[error("no route matches {path}")]
    NoRouteMatch { path: String },

    /// Upstream answered with a non-success status. `reason` is the
    /// upstream's own status text.
    #[error("upstream returned {status} {reason}")]
    Upstream { status: StatusCode, reason: String },

    /// Upstream could not be reached or its body could not be read.
    #[error("upstream transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    /// The upstream URL could not be built.
    #[error("invalid upstream url: {0}")]
    InvalidTarget(#[from] url::ParseError),

    /// The redirect location is not a valid header value.
    #[error("invalid redirect location {0:?}")]
    InvalidLocation(String),

    /// The inbound body is larger than `listener.max_body_size`.
    #[error("request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    /// The inbound body could not be buffered.
    #[error("failed to read request body: {0}")]
    RequestBody(#[source] axum::Error),
}

impl RelayError {
    /// Classify a failure to buffer the inbound body read with `limit`.
    pub fn from_body_error(err: axum::Error, limit: usize) -> Self {
        let over_limit = err
            .source()
            .is_some_and(|source| source.downcast_ref::<LengthLimitError>().is_some());
        if over_limit {
            RelayError::PayloadTooLarge { limit }
        } else {
            RelayError::RequestBody(err)
        }
    }

    /// Status code sent to the client.
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::NoRouteMatch { .. } => StatusCode::NOT_FOUND,
            RelayError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            RelayError::Upstream { status, .. } => *status,
            RelayError::Transport(_)
            | RelayError::InvalidTarget(_)
            | RelayError::InvalidLocation(_)
            | RelayError::RequestBody(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Metrics label for this failure.
    pub fn outcome(&self) -> &'static str {
        match self {
            RelayError::NoRouteMatch { .. } => "no_route",
            RelayError::Upstream { .. } => "upstream_error",
            RelayError::PayloadTooLarge { .. } => "too_large",
            _ => "failure",
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            RelayError::NoRouteMatch { path } => {
                tracing::debug!(path = %path, "No route matched");
                "Not Found"
            }
            RelayError::Upstream { status, reason } => {
                tracing::info!(status = %status, reason = %reason, "Upstream returned error status");
                reason.as_str()
            }
            RelayError::PayloadTooLarge { limit } => {
                tracing::info!(limit, "Request body too large");
                "Payload Too Large"
            }
            // The cause goes to the log only, never to the client
            other => {
                tracing::error!(error = %other, "Relay request failed");
                "Internal Server Error"
            }
        };
        (status, body.to_owned()).into_response()
    }
}
