//! Error types for the Globethrottle service.

use thiserror::Error;

/// Main error type for Globethrottle operations.
#[derive(Error, Debug)]
pub enum ThrottleError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Globethrottle operations.
pub type Result<T> = std::result::Result<T, ThrottleError>;
