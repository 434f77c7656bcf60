//! Error handling module for the launcher
//!
//! Provides the crate error type using thiserror. Loading code that only
//! needs context strings uses `anyhow` instead.

use thiserror::Error;

/// Main error type for the launcher
#[derive(Error, Debug)]
pub enum LauncherError {
    /// IO errors (file operations, process spawning)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors (loading, parsing, validation)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Descriptor shape violations
    #[error("Validation error: {0}")]
    Validation(String),

    /// Descriptor name that the catalog does not know
    #[error("Unknown descriptor: {0}")]
    UnknownDescriptor(String),

    /// Descriptor referenced by the menu but provided by someone else
    #[error("Descriptor {0} is not bundled with the launcher")]
    ExternalDescriptor(String),

    /// Malformed menu href
    #[error("Invalid href: {0}")]
    Href(String),

    /// A step failed and its policy aborted the run
    #[error("Step {index} ({method}) failed: {reason}")]
    StepFailed {
        index: usize,
        method: &'static str,
        reason: String,
    },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for launcher operations
pub type Result<T> = std::result::Result<T, LauncherError>;

impl LauncherError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an href error
    pub fn href(msg: impl Into<String>) -> Self {
        Self::Href(msg.into())
    }
}
