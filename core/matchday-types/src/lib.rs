//! Core type definitions for Matchday messaging.
//!
//! This crate defines the plain data types shared by the cipher, the
//! message store and the backfill job:
//! - Message and user identifiers (UUID, v7 for new rows)
//! - Direct message records and their content rows
//!
//! Nothing here knows whether a `content` field holds plaintext or a sealed
//! token; that distinction belongs to `matchday-crypto`.

mod ids;
mod message;

pub use ids::{MessageId, UserId};
pub use message::{ContentRow, Message, MessageType, NewMessage};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An id string that is not a UUID.
    #[error("invalid {kind} id: {source}")]
    InvalidUuid {
        kind: &'static str,
        #[source]
        source: uuid::Error,
    },

    #[error("invalid message type: {0}")]
    InvalidMessageType(String),
}
