//! Error types for the export layer.

use thiserror::Error;

/// Result type alias for export operations.
pub type Result<T> = std::result::Result<T, ExportError>;

/// Errors raised while constructing the export layer.
///
/// Runtime delivery failures are deliberately absent: once built, the
/// transport absorbs them (logged, dropped, never retried).
#[derive(Debug, Error)]
pub enum ExportError {
    /// The HTTP transport could not be constructed.
    #[error("transport error: {0}")]
    Transport(String),
}
