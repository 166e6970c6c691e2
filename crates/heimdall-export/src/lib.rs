//! Export layer for the Heimdall RUM agent.
//!
//! This crate owns the wire boundary with the collector:
//!
//! - **Encoding**: [`ZipkinEncoder`] turns finished spans into the
//!   Zipkin-style JSON the collector accepts
//! - **Transport**: [`BeaconExporter`] POSTs batches fire-and-forget, with
//!   the auth token applied to the URL once at construction
//!
//! Delivery is best-effort by design: failures are logged at debug and
//! dropped, never retried, and nothing here blocks the caller's turn.

pub mod beacon;
pub mod error;
pub mod zipkin;

pub use beacon::{BeaconConfig, BeaconExporter};
pub use error::{ExportError, Result};
pub use zipkin::ZipkinEncoder;
