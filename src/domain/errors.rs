//! Domain error types
//!
//! This module defines the error hierarchy for the exporter. Errors are
//! domain-specific and don't expose third-party types.

use thiserror::Error;

/// Main exporter error type
///
/// This is the primary error type used throughout the application.
/// It wraps repository errors and provides context for error handling.
#[derive(Debug, Clone, Error)]
pub enum BulkExportError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Content repository errors
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Node-list cache or completion journal errors
    #[error("State management error: {0}")]
    State(String),

    /// Export process errors
    #[error("Export error: {0}")]
    Export(String),

    /// A node with version history requested resolved zero revisions
    #[error("No revisions available for node {0}")]
    NoRevisions(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

impl BulkExportError {
    /// Whether the error came from talking to the repository transport
    pub fn is_connection(&self) -> bool {
        matches!(
            self,
            BulkExportError::Repository(
                RepositoryError::ConnectionFailed(_)
                    | RepositoryError::AuthenticationFailed(_)
                    | RepositoryError::Timeout(_)
            )
        )
    }
}

/// Content repository errors
///
/// Errors that occur when talking to the content repository.
/// These errors don't expose third-party HTTP client types.
#[derive(Debug, Clone, Error)]
pub enum RepositoryError {
    /// Failed to connect to the repository
    #[error("Failed to connect to repository: {0}")]
    ConnectionFailed(String),

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Node not found
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    /// Invalid response from server
    #[error("Invalid response from repository: {0}")]
    InvalidResponse(String),

    /// Search query failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Server error (5xx)
    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    /// Client error (4xx)
    #[error("Client error: {status} - {message}")]
    ClientError { status: u16, message: String },

    /// Timeout
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// The node has a content property but its bytes cannot be read
    #[error("Content unavailable for node {0}")]
    ContentUnavailable(String),
}

impl RepositoryError {
    /// Whether a retry could plausibly succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            RepositoryError::ConnectionFailed(_)
                | RepositoryError::Timeout(_)
                | RepositoryError::ServerError { .. }
        )
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for BulkExportError {
    fn from(err: std::io::Error) -> Self {
        BulkExportError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for BulkExportError {
    fn from(err: serde_json::Error) -> Self {
        BulkExportError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for BulkExportError {
    fn from(err: toml::de::Error) -> Self {
        BulkExportError::Configuration(format!("TOML parse error: {err}"))
    }
}
