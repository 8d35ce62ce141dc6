//! Counters reported at the end of a run (and carried by fatal errors).

use matchday_types::MessageId;
use serde::Serialize;
use std::fmt;

/// How a run that did not hit a fatal error ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// Still scanning; only seen on reports attached to errors.
    #[default]
    Running,
    /// Scanned to an empty page.
    Done,
    /// Stopped between pages on operator request.
    Cancelled,
}

/// Progress of a backfill run.
///
/// `scanned == already_encrypted + legacy`, and outside dry runs
/// `legacy == migrated + conflicts + failed`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BackfillReport {
    pub status: RunStatus,
    pub dry_run: bool,
    /// Pages fetched that contained at least one row.
    pub pages: u64,
    pub scanned: u64,
    /// Rows that already opened under the current key.
    pub already_encrypted: u64,
    /// Rows classified as plaintext.
    pub legacy: u64,
    /// Legacy rows sealed and written back.
    pub migrated: u64,
    /// Legacy rows whose content changed before the write landed.
    pub conflicts: u64,
    /// Legacy rows whose seal or write failed.
    pub failed: u64,
    /// Id of the last row of the last fully processed page.
    pub last_cursor: Option<MessageId>,
}

impl BackfillReport {
    /// Whether every legacy row seen was written back.
    pub fn is_clean(&self) -> bool {
        self.conflicts == 0 && self.failed == 0
    }
}

impl fmt::Display for BackfillReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "scanned {}, already encrypted {}, legacy {}, migrated {}, conflicts {}, failed {}",
            self.scanned,
            self.already_encrypted,
            self.legacy,
            self.migrated,
            self.conflicts,
            self.failed
        )?;
        match &self.last_cursor {
            Some(cursor) => write!(f, ", last cursor {cursor}"),
            None => write!(f, ", no rows processed"),
        }
    }
}
