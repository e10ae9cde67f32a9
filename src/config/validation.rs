//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parseable)
//! - Catch allow-list entries that can never match a URL host
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: RelayConfig → Result<(), Vec<ValidationError>>
//! - Runs before the config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::RelayConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid bind address: {0}")]
    InvalidBindAddress(String),

    #[error("invalid metrics address: {0}")]
    InvalidMetricsAddress(String),

    #[error("{0} must be greater than zero")]
    ZeroValue(&'static str),

    #[error("allowed host entry is empty or contains a scheme/path: {0:?}")]
    InvalidAllowedHost(String),
}

/// Check a configuration for semantic problems, collecting every error.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroValue("timeouts.request_secs"));
    }
    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::ZeroValue("timeouts.connect_secs"));
    }
    if config.limits.max_body_bytes == 0 {
        errors.push(ValidationError::ZeroValue("limits.max_body_bytes"));
    }
    if config.listener.max_connections == 0 {
        errors.push(ValidationError::ZeroValue("listener.max_connections"));
    }

    for host in &config.upstream.allowed_hosts {
        if host.is_empty() || host.contains('/') || host.contains(':') {
            errors.push(ValidationError::InvalidAllowedHost(host.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&RelayConfig::default()).is_ok());
    }

    #[test]
    fn all_errors_are_collected() {
        let mut config = RelayConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.timeouts.request_secs = 0;
        config.upstream.allowed_hosts = vec!["https://example.com".into()];

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn host_only_allow_list_entries_pass() {
        let mut config = RelayConfig::default();
        config.upstream.allowed_hosts = vec!["example.com".into(), "api.example.org".into()];
        assert!(validate_config(&config).is_ok());
    }
}
