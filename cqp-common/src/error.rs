//! Common error types for the coffee quality predictor

use thiserror::Error;

/// Common result type for predictor operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error kinds surfaced by the catalog, parser, artifact stores and handler
///
/// None of these are retried; every failure is reported to the caller as a
/// rejected request.
#[derive(Error, Debug)]
pub enum Error {
    /// Empty or malformed catalog, unreadable config file
    #[error("Configuration error: {0}")]
    Config(String),

    /// Artifact identifier does not follow the `model_<F1>_<F2>[_<F3>]_<n>.pkl` convention
    #[error("Format error: {0}")]
    Format(String),

    /// Artifact missing, corrupt or incompatible with its catalog entry
    #[error("Artifact load error: {0}")]
    ArtifactLoad(String),

    /// Request fields missing, unexpected or out of range
    #[error("Validation error: {0}")]
    Validation(String),

    /// Predictor invocation failed (unseen category, shape mismatch, service failure)
    #[error("Prediction error: {0}")]
    Prediction(String),

    /// Requested model identifier is not in the catalog
    #[error("Not found: {0}")]
    NotFound(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Short machine-readable kind, used in API error bodies and logs
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Config(_) => "configuration",
            Error::Format(_) => "format",
            Error::ArtifactLoad(_) => "artifact_load",
            Error::Validation(_) => "validation",
            Error::Prediction(_) => "prediction",
            Error::NotFound(_) => "not_found",
            Error::Io(_) => "io",
        }
    }
}
