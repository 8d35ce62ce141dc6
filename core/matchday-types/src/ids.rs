//! Identifier types used by the messaging core.
//!
//! New rows get UUID v7 ids so that id order follows creation order. Legacy
//! rows may carry v4 ids; the backfill only needs the order to be stable and
//! unique, not chronological.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Shared conversions for the UUID-backed id newtypes.
macro_rules! uuid_id {
    ($name:ident, $kind:literal) => {
        impl $name {
            /// Wraps an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            #[must_use]
            pub const fn as_uuid(&self) -> Uuid {
                self.0
            }

            /// Parses the hyphenated (or any other `uuid`-accepted) form.
            pub fn parse(s: &str) -> Result<Self> {
                Uuid::parse_str(s)
                    .map(Self)
                    .map_err(|source| Error::InvalidUuid { kind: $kind, source })
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                Self::parse(s)
            }
        }
    };
}

/// Unique identifier for a direct message.
///
/// Also the ordering key for paginated scans: ids compare by their byte
/// representation, which matches the lexical order of the lowercase
/// hyphenated form stored in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(Uuid);

uuid_id!(MessageId, "message");

impl MessageId {
    /// Creates a time-ordered id for a message being sent now.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

/// Identifier of an account, as issued by the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

uuid_id!(UserId, "user");

impl UserId {
    /// Random id; accounts are created by the identity provider, so this is
    /// mostly for seeding and tests.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}
