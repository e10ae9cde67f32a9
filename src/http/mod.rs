//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, relay handler)
//!     → request.rs (request ID)
//!     → [relay derives the outbound request from query parameters]
//!     → response.rs (rewrite upstream response, CORS, status detune)
//!     → Send to caller
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{MakeRequestUuid, X_REQUEST_ID};
pub use server::HttpServer;
