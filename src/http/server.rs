//! HTTP server setup and request handling.
//!
//! # Responsibilities
//! - Create the Axum router with the relay handler on every path
//! - Wire up middleware (timeout, body limit, request ID, tracing)
//! - Build the outbound client (redirect policy, connect timeout)
//! - Derive the outbound request, perform it, rewrite the response
//! - Observability (metrics, request IDs in log spans)

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::header::{HeaderValue, ACCESS_CONTROL_ALLOW_ORIGIN},
    http::Request,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::SetRequestIdLayer,
    set_header::SetResponseHeaderLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::RelayConfig;
use crate::http::request::{self, MakeRequestUuid};
use crate::http::response::rewrite_response;
use crate::observability::metrics;
use crate::relay::descriptor::method_label;
use crate::relay::{BodySource, OutboundRequest, RelayError, RelayParams};

/// Application state injected into the handler.
#[derive(Clone)]
pub struct AppState {
    pub client: reqwest::Client,
    pub allowed_hosts: Arc<Vec<String>>,
    pub max_body_bytes: usize,
}

/// HTTP server for the request relay.
pub struct HttpServer {
    router: Router,
    config: RelayConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    ///
    /// Fails only if the outbound client cannot be constructed (TLS
    /// backend initialization).
    pub fn new(config: RelayConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::limited(
                config.upstream.max_redirects,
            ))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()?;

        let state = AppState {
            client,
            allowed_hosts: Arc::new(config.upstream.allowed_hosts.clone()),
            max_body_bytes: config.limits.max_body_bytes,
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &RelayConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(relay_handler))
            .route("/", any(relay_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )))
            // Global, not per-route: the layer shares one semaphore across
            // every route it wraps.
            .layer(GlobalConcurrencyLimitLayer::new(
                config.listener.max_connections,
            ))
            .layer(RequestBodyLimitLayer::new(config.limits.max_body_bytes))
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            // Middleware-generated responses (timeout, body limit) must
            // carry the CORS origin header too.
            .layer(SetResponseHeaderLayer::if_not_present(
                ACCESS_CONTROL_ALLOW_ORIGIN,
                HeaderValue::from_static("*"),
            ))
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server, accepting connections on the given listener until
    /// Ctrl+C or a shutdown signal.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }
}

/// Relay handler: derive the outbound request from the query string,
/// perform it, and return the rewritten upstream response.
async fn relay_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = request::request_id(&request);
    let params = RelayParams::parse(request.uri().query().unwrap_or(""));
    let method_label = method_label(&params);

    let response = match handle_relay(&state, &params, request).await {
        Ok(response) => response,
        Err(err) => {
            tracing::warn!(
                request_id = %request_id,
                status = err.status().as_u16(),
                error = %err,
                "Relay request failed"
            );
            err.into_response()
        }
    };

    metrics::record_request(method_label, response.status().as_u16(), start_time);
    tracing::debug!(
        request_id = %request_id,
        status = response.status().as_u16(),
        elapsed_ms = start_time.elapsed().as_millis() as u64,
        "Relay request finished"
    );
    response
}

async fn handle_relay(
    state: &AppState,
    params: &RelayParams,
    request: Request<Body>,
) -> Result<Response, RelayError> {
    let outbound = OutboundRequest::from_params(params)?;
    check_allowed_host(&state.allowed_hosts, &outbound)?;

    // Resolve the body source. The inbound body is only read when a write
    // method has no `Body` override.
    let body = match outbound.body {
        BodySource::None => None,
        BodySource::Inline(body) => Some(body),
        BodySource::Inbound => {
            let bytes = axum::body::to_bytes(request.into_body(), state.max_body_bytes)
                .await
                .map_err(|_| RelayError::BodyReadError)?;
            Some(String::from_utf8_lossy(&bytes).into_owned())
        }
    };

    tracing::debug!(
        method = %outbound.method,
        target_host = outbound.target.host_str().unwrap_or(""),
        header_count = outbound.headers.len(),
        has_body = body.is_some(),
        "Forwarding to upstream"
    );

    let mut builder = state
        .client
        .request(outbound.method, outbound.target)
        .headers(outbound.headers);
    if let Some(body) = body {
        builder = builder.body(body);
    }

    let upstream = builder
        .send()
        .await
        .map_err(|err| RelayError::UpstreamFetch(err.to_string()))?;

    Ok(rewrite_response(upstream))
}

/// Reject targets outside the configured allow-list. An empty list keeps
/// the relay open, matching the original behavior.
fn check_allowed_host(
    allowed_hosts: &[String],
    outbound: &OutboundRequest,
) -> Result<(), RelayError> {
    if allowed_hosts.is_empty() {
        return Ok(());
    }
    let host = outbound.target.host_str().unwrap_or("");
    if allowed_hosts.iter().any(|h| h.eq_ignore_ascii_case(host)) {
        Ok(())
    } else {
        Err(RelayError::HostNotAllowed)
    }
}

/// Wait for Ctrl+C or an explicit shutdown trigger.
async fn shutdown_signal(mut shutdown: broadcast::Receiver<()>) {
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(err) = result {
                tracing::error!(error = %err, "Failed to install Ctrl+C handler");
            }
        }
        _ = shutdown.recv() => {}
    }
    tracing::info!("Shutdown signal received");
}
