//! Request identification.
//!
//! # Responsibilities
//! - Generate a UUIDv4 request ID for every inbound request
//! - Make the ID available to handlers and log spans
//!
//! # Design Decisions
//! - The ID is attached as early as possible so every log line on the
//!   handling path can carry it
//! - Inbound `x-request-id` values are not trusted; the relay always
//!   assigns its own

use axum::http::header::HeaderValue;
use axum::http::Request;
use tower_http::request_id::{MakeRequestId, RequestId};

/// Header the request ID travels in.
pub const X_REQUEST_ID: &str = "x-request-id";

/// UUIDv4 request ID generator for `SetRequestIdLayer`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = uuid::Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Request ID as seen by handlers; falls back to `"unknown"` when the
/// layer did not run (direct handler tests).
pub fn request_id<B>(request: &Request<B>) -> String {
    request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}
