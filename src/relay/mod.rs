//! Relay core: query-parameter parsing and outbound request derivation.
//!
//! # Data Flow
//! ```text
//! inbound query string
//!     → params.rs (ordered name→value map, double percent-decoding)
//!     → descriptor.rs (validate, build OutboundRequest)
//!     → [http::server performs the call]
//!     → http::response (rewrite upstream response)
//! ```
//!
//! # Design Decisions
//! - The outbound request is a pure function of the inbound query string
//!   (plus the inbound body for write methods without a `Body` override)
//! - Validation errors are typed (`RelayError`) and map to 4xx responses
//! - Malformed `HEADER*` entries are skipped, never fatal

pub mod descriptor;
pub mod error;
pub mod params;

pub use descriptor::{BodySource, OutboundRequest};
pub use error::RelayError;
pub use params::RelayParams;
