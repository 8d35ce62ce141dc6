//! Direct message records.
//!
//! `Message` is what the application layer sees after the store has opened
//! the sealed content. `ContentRow` is the raw projection the backfill scans:
//! just the ordering key and whatever the `content` column holds.

use crate::{Error, MessageId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of payload a message carries. Stored as lowercase text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    #[default]
    Text,
    Image,
    /// Match or lobby invitation card.
    Invite,
}

impl MessageType {
    /// Returns the column representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Invite => "invite",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "image" => Ok(Self::Image),
            "invite" => Ok(Self::Invite),
            other => Err(Error::InvalidMessageType(other.to_string())),
        }
    }
}

/// A message about to be sent. `content` is plaintext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMessage {
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub content: String,
    #[serde(default)]
    pub message_type: MessageType,
}

impl NewMessage {
    /// Creates a text message.
    pub fn text(sender_id: UserId, receiver_id: UserId, content: impl Into<String>) -> Self {
        Self {
            sender_id,
            receiver_id,
            content: content.into(),
            message_type: MessageType::Text,
        }
    }

    /// Overrides the message type.
    #[must_use]
    pub fn with_type(mut self, message_type: MessageType) -> Self {
        self.message_type = message_type;
        self
    }
}

/// A stored message with its content opened for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    /// Plaintext body.
    pub content: String,
    pub message_type: MessageType,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Whether `user` is one of the two participants.
    #[must_use]
    pub fn involves(&self, user: &UserId) -> bool {
        self.sender_id == *user || self.receiver_id == *user
    }
}

/// Raw `(id, content)` projection used by paginated scans.
///
/// `content` is exactly what the column holds: legacy plaintext or a sealed
/// token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRow {
    pub id: MessageId,
    pub content: String,
}

impl ContentRow {
    pub fn new(id: MessageId, content: impl Into<String>) -> Self {
        Self {
            id,
            content: content.into(),
        }
    }
}
