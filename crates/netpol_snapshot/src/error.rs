//! Error types for snapshot ingestion.

use thiserror::Error;

/// Errors that can occur while obtaining a snapshot.
#[derive(Debug, Error)]
pub enum Error {
    /// Kubeconfig could not be loaded or a client could not be built.
    #[error("failed to connect to cluster: {0}")]
    Connect(String),

    /// The API server rejected or failed a list request.
    #[error("failed to fetch {resource} from cluster: {source}")]
    Fetch {
        /// Resource being listed.
        resource: &'static str,
        /// Underlying client error.
        #[source]
        source: kube::Error,
    },

    /// A document is not a recognizable Kubernetes object, list or snapshot.
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    /// Unknown or unsupported file format.
    #[error("unknown format: {0}")]
    UnknownFormat(String),

    /// An object could not be placed in the snapshot.
    #[error(transparent)]
    Model(#[from] netpol_model::Error),

    /// I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON parsing error.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// YAML parsing error.
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Returns true if the cluster itself could not be read.
    #[must_use]
    pub const fn is_fetch_failure(&self) -> bool {
        matches!(self, Self::Connect(_) | Self::Fetch { .. })
    }
}

/// Result type alias for ingestion operations.
pub type Result<T> = std::result::Result<T, Error>;
