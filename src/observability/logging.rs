//! Structured logging initialization.
//!
//! Uses `tracing` with an `EnvFilter`: `RUST_LOG` wins when set, otherwise
//! the configured level applies to this crate and tower-http.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the global tracing subscriber.
///
/// `level` is the configured default (e.g., "info"); the `RUST_LOG`
/// environment variable overrides it.
pub fn init_logging(level: &str) {
    let default_filter = format!("request_relay={level},tower_http={level}");
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
