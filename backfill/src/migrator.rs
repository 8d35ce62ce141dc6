//! The page-by-page scan, classify and rewrite loop.

use crate::cancel::CancelFlag;
use crate::error::{BackfillError, BackfillResult};
use crate::report::{BackfillReport, RunStatus};
use matchday_crypto::{ContentCipher, ContentEncryptor, DecryptOutcome};
use matchday_storage::{ContentPages, StorageError, WriteOutcome};
use matchday_types::{ContentRow, MessageId};
use tracing::{debug, info, warn};

/// Rows fetched per page unless overridden.
pub const DEFAULT_PAGE_SIZE: usize = 500;

/// Knobs for a single run.
#[derive(Debug, Clone)]
pub struct BackfillOptions {
    pub page_size: usize,
    /// Resume strictly after this id instead of from the start.
    pub start_after: Option<MessageId>,
    /// Classify and count without writing anything.
    pub dry_run: bool,
}

impl Default for BackfillOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            start_after: None,
            dry_run: false,
        }
    }
}

/// A configured backfill run.
///
/// Assumes nothing else re-encrypts rows concurrently. Concurrent live
/// writers are tolerated: every write is conditional on the content that was
/// classified, so a row edited mid-run is left alone and counted as a
/// conflict.
///
/// Generic over the encryptor so the job can run against anything that
/// classifies and seals the way [`ContentCipher`] does.
#[derive(Debug)]
pub struct Backfill<E = ContentCipher> {
    cipher: E,
    options: BackfillOptions,
    cancel: CancelFlag,
}

impl<E: ContentEncryptor> Backfill<E> {
    pub fn new(cipher: E, options: BackfillOptions) -> Self {
        Self {
            cipher,
            options,
            cancel: CancelFlag::new(),
        }
    }

    /// Uses an externally owned flag, typically wired to Ctrl-C.
    #[must_use]
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_flag(&self) -> &CancelFlag {
        &self.cancel
    }

    pub fn options(&self) -> &BackfillOptions {
        &self.options
    }

    /// Runs to an empty page, a cancellation, or a fatal error.
    pub fn run<S: ContentPages>(&self, store: &S) -> BackfillResult<BackfillReport> {
        if self.options.page_size == 0 {
            return Err(BackfillError::InvalidPageSize);
        }

        let mut report = BackfillReport {
            dry_run: self.options.dry_run,
            last_cursor: self.options.start_after,
            ..BackfillReport::default()
        };

        info!(
            page_size = self.options.page_size,
            after = ?report.last_cursor,
            dry_run = self.options.dry_run,
            "backfill starting"
        );

        loop {
            if self.cancel.is_cancelled() {
                report.status = RunStatus::Cancelled;
                warn!(%report, "backfill cancelled");
                return Ok(report);
            }

            let page = match store.fetch_page(report.last_cursor.as_ref(), self.options.page_size) {
                Ok(page) => page,
                Err(source) => return Err(BackfillError::Store { source, report }),
            };
            let Some(last) = page.last().map(|row| row.id) else {
                break;
            };
            if let Err(source) = check_ordering(report.last_cursor.as_ref(), &page) {
                return Err(BackfillError::Store { source, report });
            }

            for row in &page {
                self.process_row(store, row, &mut report)?;
            }

            report.pages += 1;
            report.last_cursor = Some(last);
            info!(
                page = report.pages,
                scanned = report.scanned,
                migrated = report.migrated,
                cursor = %last,
                "page processed"
            );
        }

        report.status = RunStatus::Done;
        info!(%report, "backfill complete");
        Ok(report)
    }

    fn process_row<S: ContentPages>(
        &self,
        store: &S,
        row: &ContentRow,
        report: &mut BackfillReport,
    ) -> BackfillResult<()> {
        report.scanned += 1;

        let reason = match self.cipher.classify(&row.content) {
            DecryptOutcome::Decrypted(_) => {
                report.already_encrypted += 1;
                return Ok(());
            }
            DecryptOutcome::AuthFailed => "tag mismatch",
            DecryptOutcome::Malformed => "not a token",
        };
        report.legacy += 1;
        debug!(id = %row.id, reason, "legacy plaintext");

        if self.options.dry_run {
            return Ok(());
        }

        let token = match self.cipher.encrypt_for_storage(&row.content) {
            Ok(token) => token,
            Err(source) if source.is_configuration() => {
                return Err(BackfillError::Configuration {
                    source,
                    report: report.clone(),
                });
            }
            Err(e) => {
                warn!(id = %row.id, error = %e, "sealing failed, skipping row");
                report.failed += 1;
                return Ok(());
            }
        };

        match store.write_content(&row.id, &row.content, &token) {
            Ok(WriteOutcome::Written) => report.migrated += 1,
            Ok(WriteOutcome::Conflict) => {
                warn!(id = %row.id, "content changed since read, left untouched");
                report.conflicts += 1;
            }
            Err(e) => {
                warn!(id = %row.id, error = %e, "write failed, skipping row");
                report.failed += 1;
            }
        }
        Ok(())
    }
}

/// Rejects pages that would make the scan revisit or skip rows.
fn check_ordering(after: Option<&MessageId>, page: &[ContentRow]) -> Result<(), StorageError> {
    let mut previous = after;
    for row in page {
        if previous.is_some_and(|prev| row.id <= *prev) {
            return Err(StorageError::InvalidData(format!(
                "page not strictly ascending at {}",
                row.id
            )));
        }
        previous = Some(&row.id);
    }
    Ok(())
}
