//! Error types for the prefix-index crate

use thiserror::Error;

/// Result type for prefix-index operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for index operations
#[derive(Debug, Error)]
pub enum Error {
    /// Cache directory could not be determined
    #[error("Could not determine cache directory for the current platform")]
    CacheDirectoryNotFound,

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Directory traversal error
    #[error("Directory traversal error: {0}")]
    Walk(#[from] walkdir::Error),

    /// A bulk insert session is already active
    #[error("A bulk insert session is already active")]
    BulkSessionActive,
}
