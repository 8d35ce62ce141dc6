//! Raw paginated access to message content.
//!
//! This is the only storage surface the backfill job needs. It deals in the
//! stored `content` value verbatim and never seals or opens anything.

use crate::error::StorageResult;
use matchday_types::{ContentRow, MessageId};

/// Result of a conditional content write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The row still held the expected content and was replaced.
    Written,
    /// The row changed (or vanished) since it was read; nothing was written.
    Conflict,
}

/// Forward-only scan and compare-and-swap rewrite of message content.
pub trait ContentPages {
    /// Returns up to `limit` rows in strictly increasing id order, excluding
    /// every id at or before `after`.
    fn fetch_page(&self, after: Option<&MessageId>, limit: usize) -> StorageResult<Vec<ContentRow>>;

    /// Replaces one row's content if it still equals `expected`.
    fn write_content(
        &self,
        id: &MessageId,
        expected: &str,
        content: &str,
    ) -> StorageResult<WriteOutcome>;
}

impl<T: ContentPages + ?Sized> ContentPages for &T {
    fn fetch_page(&self, after: Option<&MessageId>, limit: usize) -> StorageResult<Vec<ContentRow>> {
        (**self).fetch_page(after, limit)
    }

    fn write_content(
        &self,
        id: &MessageId,
        expected: &str,
        content: &str,
    ) -> StorageResult<WriteOutcome> {
        (**self).write_content(id, expected, content)
    }
}
