//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! relay handler produces:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through all log lines on the handling path
//! - Metrics are cheap (atomic increments)
//! - The metrics exporter is optional and off by default

pub mod logging;
pub mod metrics;
