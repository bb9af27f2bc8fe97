use std::path::PathBuf;

use thiserror::Error;

/// Convenient result alias for the NextStop library.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// No suitable project directories could be resolved for the cache file.
    #[error("failed to resolve project directories for the system cache")]
    ProjectDirsUnavailable,

    /// Raised when the persisted cache file could not be parsed.
    #[error("cache file at {path} is not a valid key/value map: {message}")]
    CacheFileCorrupt { path: PathBuf, message: String },

    /// Raised when a remote service answered with an unexpected status code.
    #[error("remote service {service} returned status {status}")]
    UnexpectedStatus {
        service: &'static str,
        status: reqwest::StatusCode,
    },

    /// Wrapper for HTTP client errors.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// Wrapper for IO errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Wrapper for JSON serialization errors.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
