//! Outbound request derivation.
//!
//! # Responsibilities
//! - Validate `dieuri` into an absolute target URL
//! - Resolve the HTTP method against the allowed set
//! - Assemble outbound headers from `HEADER*` parameters
//! - Decide where the outbound body comes from
//!
//! # Design Decisions
//! - The descriptor borrows nothing from the inbound request: the caller
//!   resolves `BodySource::Inbound` itself, keeping this module free of I/O
//! - Header entries that fail to parse are skipped, mirroring the lenient
//!   handling of the `Name: Value` format

use axum::http::header::{HeaderMap, HeaderName, HeaderValue};
use axum::http::Method;
use url::Url;

use crate::relay::error::RelayError;
use crate::relay::params::RelayParams;

/// Methods the relay will issue upstream.
const ALLOWED_METHODS: &[Method] = &[
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
    Method::HEAD,
    Method::OPTIONS,
];

/// Where the outbound body comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodySource {
    /// No body is attached (GET, HEAD, OPTIONS).
    None,
    /// Body given inline via the `Body` parameter, already decoded.
    Inline(String),
    /// Body to be read from the inbound request.
    Inbound,
}

/// Fully validated description of the outbound request.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub target: Url,
    pub method: Method,
    pub headers: HeaderMap,
    pub body: BodySource,
}

impl OutboundRequest {
    /// Derive the outbound request from the inbound query parameters.
    pub fn from_params(params: &RelayParams) -> Result<Self, RelayError> {
        let target = parse_target(params)?;
        let method = parse_method(params)?;
        let headers = collect_headers(params);
        let body = body_source(params, &method)?;

        Ok(Self {
            target,
            method,
            headers,
            body,
        })
    }

    /// Whether the method carries a body upstream.
    pub fn is_write_method(method: &Method) -> bool {
        matches!(
            *method,
            Method::POST | Method::PUT | Method::PATCH | Method::DELETE
        )
    }
}

fn parse_target(params: &RelayParams) -> Result<Url, RelayError> {
    let raw = params
        .get_decoded("dieuri")
        .ok_or(RelayError::MissingParameter)?
        .map_err(|_| RelayError::InvalidUrl)?;
    Url::parse(&raw).map_err(|_| RelayError::InvalidUrl)
}

/// Bounded metric label for the requested method: one of the allowed
/// methods, or `"INVALID"` for anything else. Keeps arbitrary client
/// strings out of metric label cardinality.
pub fn method_label(params: &RelayParams) -> &'static str {
    let Some(raw) = params.get("Method") else {
        return "GET";
    };
    let name = raw.to_ascii_uppercase();
    ALLOWED_METHODS
        .iter()
        .find(|m| m.as_str() == name)
        .map(|m| m.as_str())
        .unwrap_or("INVALID")
}

fn parse_method(params: &RelayParams) -> Result<Method, RelayError> {
    let name = match params.get("Method") {
        Some(m) => m.to_ascii_uppercase(),
        None => return Ok(Method::GET),
    };
    ALLOWED_METHODS
        .iter()
        .find(|m| m.as_str() == name)
        .cloned()
        .ok_or(RelayError::UnsupportedMethod(name))
}

/// Build the outbound header map from `HEADER*` parameters.
///
/// Parameters are visited in ascending lexicographic order of their name,
/// so a later parameter overwrites an earlier one that names the same
/// header. Entries with no `:`, an empty name or value after trimming, or
/// characters that do not form a legal header are skipped without error.
fn collect_headers(params: &RelayParams) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for (param, raw) in params.header_params() {
        let Ok(decoded) = urlencoding::decode(raw) else {
            tracing::debug!(param, "skipping header parameter: invalid encoding");
            continue;
        };
        let Some((name, value)) = decoded.split_once(':') else {
            tracing::debug!(param, "skipping header parameter: no separator");
            continue;
        };
        let (name, value) = (name.trim(), value.trim());
        if name.is_empty() || value.is_empty() {
            continue;
        }
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => {
                tracing::debug!(param, "skipping header parameter: illegal header");
            }
        }
    }
    headers
}

fn body_source(params: &RelayParams, method: &Method) -> Result<BodySource, RelayError> {
    if !OutboundRequest::is_write_method(method) {
        return Ok(BodySource::None);
    }
    match params.get_decoded("Body") {
        Some(Ok(body)) => Ok(BodySource::Inline(body)),
        Some(Err(_)) => Err(RelayError::InvalidBodyEncoding),
        None => Ok(BodySource::Inbound),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(query: &str) -> Result<OutboundRequest, RelayError> {
        OutboundRequest::from_params(&RelayParams::parse(query))
    }

    #[test]
    fn minimal_request_defaults_to_get() {
        let req = descriptor("dieuri=https%3A%2F%2Fexample.com%2F").unwrap();
        assert_eq!(req.method, Method::GET);
        assert_eq!(req.target.as_str(), "https://example.com/");
        assert!(req.headers.is_empty());
        assert_eq!(req.body, BodySource::None);
    }

    #[test]
    fn missing_dieuri_is_rejected() {
        assert!(matches!(
            descriptor("Method=GET"),
            Err(RelayError::MissingParameter)
        ));
    }

    #[test]
    fn relative_url_is_rejected() {
        assert!(matches!(
            descriptor("dieuri=%2Fjust%2Fa%2Fpath"),
            Err(RelayError::InvalidUrl)
        ));
    }

    #[test]
    fn method_is_case_insensitive() {
        let req = descriptor("dieuri=https%3A%2F%2Fexample.com%2F&Method=post").unwrap();
        assert_eq!(req.method, Method::POST);
    }

    #[test]
    fn method_label_collapses_unsupported_values() {
        let label = |q: &str| method_label(&RelayParams::parse(q));
        assert_eq!(label("dieuri=x"), "GET");
        assert_eq!(label("Method=post"), "POST");
        assert_eq!(label("Method=TRACE"), "INVALID");
        assert_eq!(label("Method=%3Cscript%3E"), "INVALID");
    }

    #[test]
    fn unsupported_method_is_rejected() {
        match descriptor("dieuri=https%3A%2F%2Fexample.com%2F&Method=trace") {
            Err(RelayError::UnsupportedMethod(m)) => assert_eq!(m, "TRACE"),
            other => panic!("expected UnsupportedMethod, got {other:?}"),
        }
    }

    #[test]
    fn header_params_become_headers() {
        let req = descriptor(
            "dieuri=https%3A%2F%2Fexample.com%2F\
             &HEADER1=x-first%3A%20one\
             &HEADER2=x-second%3Atwo",
        )
        .unwrap();
        assert_eq!(req.headers.get("x-first").unwrap(), "one");
        assert_eq!(req.headers.get("x-second").unwrap(), "two");
    }

    #[test]
    fn later_param_name_overwrites_same_header() {
        let req = descriptor(
            "dieuri=https%3A%2F%2Fexample.com%2F\
             &HEADER1=x-dup%3A%20first\
             &HEADER2=x-dup%3A%20second",
        )
        .unwrap();
        assert_eq!(req.headers.get("x-dup").unwrap(), "second");
    }

    #[test]
    fn lexicographic_order_decides_overwrites() {
        // HEADER10 sorts before HEADER2, so HEADER2 wins.
        let req = descriptor(
            "dieuri=https%3A%2F%2Fexample.com%2F\
             &HEADER10=x-dup%3A%20ten\
             &HEADER2=x-dup%3A%20two",
        )
        .unwrap();
        assert_eq!(req.headers.get("x-dup").unwrap(), "two");
    }

    #[test]
    fn header_without_separator_is_skipped() {
        let req = descriptor(
            "dieuri=https%3A%2F%2Fexample.com%2F&HEADER1=no-separator-here",
        )
        .unwrap();
        assert!(req.headers.is_empty());
    }

    #[test]
    fn header_with_empty_name_or_value_is_skipped() {
        let req = descriptor(
            "dieuri=https%3A%2F%2Fexample.com%2F\
             &HEADER1=%3A%20value-only\
             &HEADER2=name-only%3A%20%20",
        )
        .unwrap();
        assert!(req.headers.is_empty());
    }

    #[test]
    fn undecodable_body_param_is_rejected() {
        // "%25FF" form-decodes to "%FF"; the second decode yields the lone
        // byte 0xFF, which is not valid UTF-8.
        assert!(matches!(
            descriptor("dieuri=https%3A%2F%2Fexample.com%2F&Method=POST&Body=%25FF"),
            Err(RelayError::InvalidBodyEncoding)
        ));
    }

    #[test]
    fn undecodable_body_is_ignored_for_read_methods() {
        // GET never attaches a body, so the broken encoding is never
        // decoded.
        let req = descriptor("dieuri=https%3A%2F%2Fexample.com%2F&Body=%25FF").unwrap();
        assert_eq!(req.body, BodySource::None);
    }

    #[test]
    fn body_param_wins_for_write_methods() {
        let req =
            descriptor("dieuri=https%3A%2F%2Fexample.com%2F&Method=POST&Body=hello%2520world")
                .unwrap();
        assert_eq!(req.body, BodySource::Inline("hello world".to_string()));
    }

    #[test]
    fn write_method_without_body_param_reads_inbound() {
        let req = descriptor("dieuri=https%3A%2F%2Fexample.com%2F&Method=PUT").unwrap();
        assert_eq!(req.body, BodySource::Inbound);
    }

    #[test]
    fn get_never_attaches_a_body() {
        let req = descriptor("dieuri=https%3A%2F%2Fexample.com%2F&Body=ignored").unwrap();
        assert_eq!(req.body, BodySource::None);
    }
}
