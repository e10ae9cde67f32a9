//! Response handling and transformation.
//!
//! # Responsibilities
//! - Transform the upstream response for the caller
//! - Force CORS headers, strip security headers
//! - Detune redirect status codes so callers see the redirect instead of
//!   auto-following it
//! - Stream the upstream body without buffering
//!
//! # Design Decisions
//! - Hop-by-hop framing headers are not copied; the server re-frames
//! - 3xx redirect codes are shifted by +10 (302 → 312), preserving the
//!   redirect intent in a code no client auto-follows

use axum::body::Body;
use axum::http::header::{HeaderMap, HeaderName, HeaderValue, ACCESS_CONTROL_ALLOW_ORIGIN};
use axum::http::StatusCode;
use axum::response::Response;

/// Headers never copied from the upstream response. Framing is the
/// relay's own concern.
static HOP_BY_HOP_HEADERS: [HeaderName; 3] = [
    HeaderName::from_static("connection"),
    HeaderName::from_static("transfer-encoding"),
    HeaderName::from_static("keep-alive"),
];

/// Security headers removed from every relayed response.
static STRIPPED_HEADERS: [HeaderName; 3] = [
    HeaderName::from_static("content-security-policy"),
    HeaderName::from_static("content-security-policy-report-only"),
    HeaderName::from_static("clear-site-data"),
];

/// Redirect codes the relay detunes by +10.
const DETUNED_REDIRECTS: &[u16] = &[301, 302, 303, 307, 308];

/// Build the relayed response from the upstream reply.
///
/// `upstream` is consumed; its body is streamed through unchanged.
pub fn rewrite_response(upstream: reqwest::Response) -> Response {
    let status = detune_status(upstream.status());
    let headers = rewrite_headers(upstream.headers());

    let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

/// Copy upstream headers, then apply the CORS/security rewrite.
pub fn rewrite_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(upstream.len() + 2);
    for (name, value) in upstream {
        if HOP_BY_HOP_HEADERS.contains(name) {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }

    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        HeaderName::from_static("access-control-expose-headers"),
        HeaderValue::from_static("*"),
    );
    for name in &STRIPPED_HEADERS {
        headers.remove(name);
    }
    headers
}

/// Shift redirect status codes by +10 so the caller does not auto-follow.
pub fn detune_status(status: StatusCode) -> StatusCode {
    let code = status.as_u16();
    if DETUNED_REDIRECTS.contains(&code) {
        // 311..=318 are all representable status codes.
        StatusCode::from_u16(code + 10).unwrap_or(status)
    } else {
        status
    }
}

/// Standard reply constructor: every response the relay originates carries
/// `access-control-allow-origin: *`.
pub fn relay_reply(body: String, status: StatusCode) -> Response {
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    response
}
