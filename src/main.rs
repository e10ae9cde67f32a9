//! Request relay binary.
//!
//! ```text
//!                        ┌──────────────────────────────────────────────┐
//!                        │                REQUEST RELAY                  │
//!                        │                                               │
//!   GET /?dieuri=...     │  ┌─────────┐   ┌────────────┐   ┌─────────┐  │
//!   ─────────────────────┼─▶│  http   │──▶│   relay    │──▶│ reqwest │──┼──▶ Target
//!                        │  │ server  │   │ descriptor │   │ client  │  │    URL
//!                        │  └─────────┘   └────────────┘   └────┬────┘  │
//!                        │                                      │       │
//!   rewritten response   │  ┌──────────────────────┐            │       │
//!   ◀────────────────────┼──│ response rewrite      │◀──────────┘       │
//!                        │  │ CORS / strip / detune │                   │
//!                        │  └──────────────────────┘                    │
//!                        └──────────────────────────────────────────────┘
//! ```
//!
//! Usage: `request-relay [config.toml]` — without an argument, built-in
//! defaults apply (listen on 0.0.0.0:8080, open relay).

use std::path::Path;

use tokio::net::TcpListener;

use request_relay::config::{load_config, RelayConfig};
use request_relay::http::HttpServer;
use request_relay::lifecycle::Shutdown;
use request_relay::observability::{logging, metrics};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match std::env::args().nth(1) {
        Some(path) => load_config(Path::new(&path))?,
        None => RelayConfig::default(),
    };

    logging::init_logging(&config.observability.log_level);
    tracing::info!("request-relay v0.1.0 starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_redirects = config.upstream.max_redirects,
        allowed_hosts = config.upstream.allowed_hosts.len(),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );
    if config.upstream.allowed_hosts.is_empty() {
        tracing::warn!("No allowed_hosts configured: relay accepts any target host");
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!(address = %local_addr, "Listening for connections");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
