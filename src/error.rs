//! Error types for the inkpress application.
//!
//! Uses `thiserror` for structured error definitions that provide
//! clear context about what went wrong.

use thiserror::Error;

/// Main error type for content acquisition.
///
/// None of these escape the batch boundary: `fetch_chapter` converts retry
/// exhaustion into placeholder chapter text instead of returning an error.
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP request failed (timeout, connection reset, DNS).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status.
    #[error("Unexpected status: {0}")]
    Status(reqwest::StatusCode),

    /// The host returned its access-denial sentinel for a sessionless request.
    #[error("Access denied: host rejected the visitor session")]
    AccessDenied,

    /// Story or chapter does not exist on the host.
    #[error("Not found: {0}")]
    NotFound(String),

    /// URL parsing or validation failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Failed to decode a metadata response.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// All retry attempts exhausted.
    #[error("All {attempts} attempts exhausted: {last}")]
    AttemptsExhausted { attempts: u32, last: String },
}

/// Error type for configuration operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse config file
    #[error("Failed to parse config: {0}")]
    ParseError(String),

    /// Invalid configuration value
    #[error("Invalid config value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Config directory not found
    #[error("Could not determine config directory")]
    NoConfigDir,
}

/// Error type for document assembly.
///
/// Assembly is total over bundle shapes; the only failure source is the
/// output sink itself.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Writing to the output sink failed (closed connection, full disk).
    #[error("Failed to write document: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using anyhow for application-level error handling.
pub type Result<T> = anyhow::Result<T>;
