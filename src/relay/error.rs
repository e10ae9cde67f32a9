//! Relay error taxonomy.
//!
//! Every failure on the handling path maps to exactly one variant here.
//! Validation failures are 400s, allow-list rejections 403, anything that
//! went wrong talking to the upstream is a 502. No variant is fatal to the
//! process; each inbound call fails independently.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::http::response::relay_reply;

/// Errors produced while deriving or performing the outbound request.
///
/// The `Display` text of each variant is the exact response body sent to
/// the caller.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The required `dieuri` query parameter was absent.
    #[error("Missing \"dieuri\" parameter.")]
    MissingParameter,

    /// `dieuri` failed percent-decoding or absolute-URL parsing.
    #[error("Invalid \"dieuri\" URL.")]
    InvalidUrl,

    /// `Method` was outside the allowed set.
    #[error("Unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    /// The `Body` parameter failed percent-decoding.
    #[error("Invalid \"Body\" parameter encoding.")]
    InvalidBodyEncoding,

    /// The inbound request body could not be read.
    #[error("Failed to read the request body.")]
    BodyReadError,

    /// The target host is not on the configured allow-list.
    #[error("Target host not allowed.")]
    HostNotAllowed,

    /// The outbound call failed at the transport level (DNS, connect,
    /// TLS, timeout). The client's diagnostic is included in the body.
    #[error("Error fetching the target URL:\n{0}")]
    UpstreamFetch(String),
}

impl RelayError {
    /// HTTP status code this error surfaces as.
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::MissingParameter
            | RelayError::InvalidUrl
            | RelayError::UnsupportedMethod(_)
            | RelayError::InvalidBodyEncoding
            | RelayError::BodyReadError => StatusCode::BAD_REQUEST,
            RelayError::HostNotAllowed => StatusCode::FORBIDDEN,
            RelayError::UpstreamFetch(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        relay_reply(self.to_string(), self.status())
    }
}
