//! # AppError
//!
//! Error types shared by the post repository and its storage port.

use thiserror::Error;

/// Failures raised by a `KeyValueStore` implementation.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The backing store refused the write (e.g., browser-style quota)
    #[error("storage quota exceeded: {used} of {limit} bytes in use")]
    QuotaExceeded { used: usize, limit: usize },

    /// Disk or OS failure in a persistent backend
    #[error("storage i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing data could not be decoded
    #[error("corrupt storage data: {0}")]
    Corrupt(String),
}

/// The primary error type for all domain and service operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Validation failure (e.g., missing title, malformed date)
    #[error("validation error: {0}")]
    ValidationError(String),

    /// Every post id has been handed out
    #[error("no post ids left to assign")]
    IdsExhausted,

    /// Persistence failure from the key-value store
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),

    /// A record could not be encoded or decoded
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A specialized Result type for post-notes logic.
pub type Result<T> = std::result::Result<T, AppError>;
