//! Error types for the storage layer.

use matchday_crypto::CryptoError;
use matchday_types::MessageId;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur in storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database error from DuckDB.
    #[error("database error: {0}")]
    Database(#[from] duckdb::Error),

    /// Message not found.
    #[error("message not found: {0}")]
    NotFound(MessageId),

    /// IO error (file system).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A column held a value that does not parse.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Content could not be sealed before insert.
    #[error("encryption error: {0}")]
    Encryption(#[source] CryptoError),

    /// Stored content did not open under the current key.
    #[error("data integrity error on message {id}: {source}")]
    Integrity {
        id: MessageId,
        #[source]
        source: CryptoError,
    },
}
