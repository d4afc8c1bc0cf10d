//! Unified error types for the iza workspace.
//!
//! Each crate maps its failures onto these common variants; the CLI crate
//! wraps them in `anyhow` at the command boundary.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum IzaError {
    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// A permission or capability error.
    #[error("permission denied: {message}")]
    PermissionDenied {
        /// Description of the denied operation.
        message: String,
    },

    /// An image download failed.
    #[error("download of {url} failed: {reason}")]
    Download {
        /// URL that was being fetched.
        url: String,
        /// Description of the failure.
        reason: String,
    },

    /// An archive could not be read or extracted.
    #[error("archive {path} is unusable: {reason}")]
    Archive {
        /// Path of the offending archive.
        path: PathBuf,
        /// Description of the failure.
        reason: String,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, IzaError>;
