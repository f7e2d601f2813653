//! Error types for record store operations.

use std::io;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The batch log could not be encoded or decoded.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// The store contents are corrupted.
    #[error("storage corrupted: {0}")]
    Corrupted(String),

    /// The store refused the write.
    #[error("write rejected: {0}")]
    Rejected(String),
}

impl StorageError {
    /// Creates a rejected-write error.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected(message.into())
    }
}
