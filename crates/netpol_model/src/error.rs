//! Error types for snapshot model validation.

use thiserror::Error;

/// Errors that can occur while assembling a snapshot.
#[derive(Debug, Error)]
pub enum Error {
    /// An object is missing an identifying field.
    #[error("missing required field: {0}")]
    MissingField(String),

    /// An object is structurally valid but cannot be placed in the snapshot.
    #[error("validation error: {0}")]
    Validation(String),
}

/// Result type alias for model operations.
pub type Result<T> = std::result::Result<T, Error>;
