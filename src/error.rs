//! Error types for cache operations.

use thiserror::Error;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while resolving, storing or loading cached data.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
    /// The identifier does not satisfy the naming rule.
    #[error("The argument {0} has to be a valid variable name")]
    InvalidIdentifier(String),

    /// Tagging was requested without any tags.
    #[error("Cannot do tags on an empty tags list")]
    EmptyTagSet,

    /// The backing store failed or is unreachable.
    #[error("Backend error: {0}")]
    BackendError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    /// Stored bytes are not a cache envelope written by this crate.
    #[error("Invalid cache entry: {0}")]
    InvalidCacheEntry(String),

    #[error("Cache schema version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },

    /// The data producer failed.
    #[error("Producer error: {0}")]
    ProducerError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl Error {
    /// Whether the error was caused by the caller's configuration rather than
    /// by the store or the producer.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidIdentifier(_) | Error::EmptyTagSet | Error::ConfigError(_)
        )
    }
}
