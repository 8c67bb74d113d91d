//! Core error type.
//!
//! Error messages are informative for operators but never echo secrets or
//! say which of several equivalent checks failed.

use thiserror::Error;

/// Result type alias using the core error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Cryptographic error.
    #[error("cryptographic error: {0}")]
    Crypto(String),

    /// Authentication error.
    ///
    /// Uses a generic message to prevent client enumeration.
    #[error("authentication failed")]
    Authentication,

    /// Validation error.
    #[error("validation error: {0}")]
    Validation(String),

    /// Internal error.
    #[error("internal error")]
    Internal,
}

impl Error {
    /// Returns whether this error should be logged at error level.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Storage(_) | Self::Crypto(_) | Self::Config(_) | Self::Internal
        )
    }
}
