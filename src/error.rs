//! Error types for batch-dl
//!
//! This module provides the error handling for the library, including:
//! - Domain-specific error types (fetch, snapshot, configuration)
//! - HTTP status code mapping for API integration
//! - The JSON error body returned by the HTTP surface

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for batch-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for batch-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "download_dir")
        key: Option<String>,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A single file fetch failed
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Reading or writing the state snapshot failed
    #[error("snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    /// Client request rejected before any state was touched
    #[error("{0}")]
    Validation(String),

    /// Task not found
    #[error("task not found: {0}")]
    NotFound(String),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),
}

/// Failure of a single URL fetch.
///
/// The `Display` text is what ends up in the `error` field of a failed file.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// The origin answered with a non-2xx status
    #[error("{status}")]
    HttpStatus {
        /// URL that was requested
        url: String,
        /// Status line, e.g. "500 Internal Server Error"
        status: String,
    },

    /// Connection, TLS or protocol failure before or during the body transfer
    #[error("request to {url} failed: {reason}")]
    Transport {
        /// URL that was requested
        url: String,
        /// Underlying transport error
        reason: String,
    },

    /// The request exceeded the configured fetch timeout
    #[error("request to {url} timed out after {seconds}s")]
    Timeout {
        /// URL that was requested
        url: String,
        /// Timeout that was exceeded
        seconds: u64,
    },

    /// Creating or writing the destination file failed
    #[error("failed to write {path}: {reason}")]
    Write {
        /// Destination path
        path: PathBuf,
        /// Underlying I/O error
        reason: String,
    },
}

/// State snapshot persistence errors
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The snapshot file exists but could not be read
    #[error("failed to read snapshot {path}: {source}")]
    Read {
        /// Snapshot path
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// The snapshot file is not a valid task map
    #[error("failed to parse snapshot {path}: {source}")]
    Parse {
        /// Snapshot path
        path: PathBuf,
        /// Underlying decode error
        source: serde_json::Error,
    },

    /// Writing or renaming the snapshot file failed
    #[error("failed to write snapshot {path}: {source}")]
    Write {
        /// Snapshot path
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },
}

/// API error response format
///
/// # Example JSON Response
///
/// ```json
/// { "error": "no urls" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// Human-readable error message
    pub error: String,
}

impl ApiError {
    /// Create a new API error from a message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }

    /// Create a "not found" error
    pub fn not_found() -> Self {
        Self::new("not found")
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - Client error (invalid input)
            Error::Validation(_) => 400,
            Error::Config { .. } => 400,

            // 404 Not Found
            Error::NotFound(_) => 404,

            // 502 Bad Gateway - Origin failures
            Error::Network(_) => 502,
            Error::Fetch(_) => 502,

            // 500 Internal Server Error - Server-side issues
            Error::Io(_) => 500,
            Error::Serialization(_) => 500,
            Error::Snapshot(_) => 500,
            Error::ApiServerError(_) => 500,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Io(_) => "io_error",
            Error::Network(_) => "network_error",
            Error::Serialization(_) => "serialization_error",
            Error::Fetch(e) => match e {
                FetchError::HttpStatus { .. } => "http_status",
                FetchError::Transport { .. } => "transport_error",
                FetchError::Timeout { .. } => "timeout",
                FetchError::Write { .. } => "write_failed",
            },
            Error::Snapshot(e) => match e {
                SnapshotError::Read { .. } => "snapshot_read_failed",
                SnapshotError::Parse { .. } => "snapshot_parse_failed",
                SnapshotError::Write { .. } => "snapshot_write_failed",
            },
            Error::Validation(_) => "validation_error",
            Error::NotFound(_) => "not_found",
            Error::ApiServerError(_) => "api_server_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        match error {
            Error::Validation(message) => ApiError::new(message),
            Error::NotFound(_) => ApiError::not_found(),
            other => ApiError::new(other.to_string()),
        }
    }
}
