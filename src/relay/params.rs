//! Query parameter collection.
//!
//! The inbound query string is the whole control surface of the relay:
//! `dieuri` names the target, `Method` the verb, `HEADER*` the outbound
//! headers and `Body` an optional body override. This module turns the raw
//! query string into a sorted name→value map and applies the second round
//! of percent-decoding the protocol calls for.

use std::borrow::Cow;
use std::collections::BTreeMap;

/// Prefix selecting header-carrying parameters (`HEADER1`, `HEADER2`, ...).
pub const HEADER_PARAM_PREFIX: &str = "HEADER";

/// Parsed query parameters, keyed by parameter name.
///
/// Backed by a `BTreeMap` so that iteration over `HEADER*` parameters is
/// lexicographic by parameter name. Note that lexicographic order puts
/// `HEADER10` before `HEADER2`; clients relying on ordering use one-digit
/// indices. When the same parameter name appears more than once in the
/// query string, the last occurrence wins.
#[derive(Debug, Default, Clone)]
pub struct RelayParams {
    params: BTreeMap<String, String>,
}

impl RelayParams {
    /// Parse a raw query string (without the leading `?`).
    ///
    /// Values are form-decoded once here; protocol values get a second
    /// decode via [`RelayParams::get_decoded`].
    pub fn parse(query: &str) -> Self {
        let mut params = BTreeMap::new();
        for (name, value) in url::form_urlencoded::parse(query.as_bytes()) {
            params.insert(name.into_owned(), value.into_owned());
        }
        Self { params }
    }

    /// Raw (single-decoded) value of a parameter.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Value of a parameter after the second percent-decode.
    ///
    /// Returns `Some(Err(..))` when the decoded bytes are not valid UTF-8,
    /// so callers can surface their own typed error.
    ///
    /// Malformed percent sequences (`%ZZ`, a trailing `%A`) pass through
    /// literally rather than failing. This is deliberately more lenient
    /// than a strict decoder, which would reject the whole value; only
    /// sequences that decode to invalid UTF-8 are errors.
    pub fn get_decoded(&self, name: &str) -> Option<Result<String, std::string::FromUtf8Error>> {
        self.params
            .get(name)
            .map(|raw| urlencoding::decode(raw).map(Cow::into_owned))
    }

    /// All `HEADER*` parameters in ascending lexicographic order of their
    /// parameter name, as (parameter name, raw value) pairs.
    pub fn header_params(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params
            .iter()
            .filter(|(name, _)| name.starts_with(HEADER_PARAM_PREFIX))
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }
}
