//! Error types for the Shelfguard service.

use thiserror::Error;

/// Main error type for Shelfguard operations.
#[derive(Error, Debug)]
pub enum ShelfError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Book store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by a book store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("no book with id {0}")]
    NotFound(i32),
    #[error("invalid book: {0}")]
    Invalid(String),
}

impl From<::config::ConfigError> for ShelfError {
    fn from(err: ::config::ConfigError) -> Self {
        ShelfError::Config(err.to_string())
    }
}

/// Result type alias for Shelfguard operations.
pub type Result<T> = std::result::Result<T, ShelfError>;
