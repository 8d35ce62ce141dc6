//! Fatal outcomes of a backfill run.

use crate::report::BackfillReport;
use matchday_crypto::CryptoError;
use matchday_storage::StorageError;
use thiserror::Error;

/// Result type for backfill runs.
pub type BackfillResult<T> = Result<T, BackfillError>;

/// Errors that abort a run.
///
/// Each run-time variant carries the report as it stood when the run
/// stopped, so the operator can resume from `report.last_cursor`.
#[derive(Debug, Error)]
pub enum BackfillError {
    /// Page size of zero would never make progress.
    #[error("page size must be at least 1")]
    InvalidPageSize,

    /// The content key cannot seal anything.
    #[error("content key unusable: {source}")]
    Configuration {
        #[source]
        source: CryptoError,
        report: BackfillReport,
    },

    /// A page could not be fetched, or the store broke the ordering contract.
    #[error("store failure ({report}): {source}")]
    Store {
        #[source]
        source: StorageError,
        report: BackfillReport,
    },
}

impl BackfillError {
    /// Progress at the time of the abort, if the run had started.
    pub fn report(&self) -> Option<&BackfillReport> {
        match self {
            Self::InvalidPageSize => None,
            Self::Configuration { report, .. } | Self::Store { report, .. } => Some(report),
        }
    }
}
