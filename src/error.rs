//! Error types for mailsense.

/// Top-level error type for the service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Mail error: {0}")]
    Mail(#[from] MailError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Inference error: {0}")]
    Inference(#[from] InferenceError),

    #[error("Ingest error: {0}")]
    Ingest(#[from] IngestError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Errors from the MIME parse boundary.
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Unparsable message: {0}")]
    Unparsable(String),
}

/// Key-value store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to open store: {0}")]
    Open(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Inference backend errors.
#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("Backend {backend} request failed: {reason}")]
    RequestFailed { backend: String, reason: String },

    #[error("Invalid response from {backend}: {reason}")]
    InvalidResponse { backend: String, reason: String },
}

/// Request-level ingestion errors.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Result type alias for the service.
pub type Result<T> = std::result::Result<T, Error>;
