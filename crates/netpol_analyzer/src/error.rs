//! Error types for analysis.

use thiserror::Error;

/// Errors that can occur while running an analysis.
///
/// Classification outcomes are never errors; only the machinery can fail.
#[derive(Debug, Error)]
pub enum Error {
    /// A namespace worker panicked or was cancelled.
    #[error("analysis worker failed: {0}")]
    Worker(String),

    /// The report could not be serialized.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Result type alias for analysis operations.
pub type Result<T> = std::result::Result<T, Error>;
