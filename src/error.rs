//! Error types for the Quotagate crate.

use thiserror::Error;

/// Main error type for Quotagate operations.
#[derive(Error, Debug)]
pub enum QuotagateError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Quotagate operations.
pub type Result<T> = std::result::Result<T, QuotagateError>;
