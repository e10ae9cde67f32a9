//! Query-parameter-driven HTTP request relay.
//!
//! An inbound request describes, entirely in its query string, an outbound
//! request to perform: `dieuri` names the target URL, `Method` the verb,
//! `HEADER1`, `HEADER2`, ... the headers and `Body` an optional body. The
//! relay performs the call (redirects auto-followed) and returns the
//! upstream response with CORS headers forced, security headers stripped
//! and redirect status codes shifted by +10 so the caller sees the
//! redirect instead of following it.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod relay;

pub use config::RelayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use relay::RelayError;
