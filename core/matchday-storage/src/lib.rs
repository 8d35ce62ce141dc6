//! DuckDB storage layer for Matchday direct messages.
//!
//! # Architecture
//!
//! - One `messages` table; `content` holds either a sealed token or, for rows
//!   written before at-rest encryption, legacy plaintext
//! - The live path seals on insert and opens on read through
//!   [`matchday_crypto::ContentEncryptor`]; it never returns stored content
//!   unopened
//! - [`ContentPages`] is the narrow raw view the backfill job scans and
//!   rewrites

mod error;
mod message_store;
mod pages;

pub use error::{StorageError, StorageResult};
pub use message_store::MessageStore;
pub use pages::{ContentPages, WriteOutcome};

/// Open a DuckDB connection, recovering from a stale WAL file.
///
/// An unclean shutdown can leave a `.wal` next to the database that blocks
/// reopening. If the first open fails and such a file exists, it is removed
/// and the open is retried once.
pub fn open_duckdb_with_wal_recovery(path: &std::path::Path) -> StorageResult<duckdb::Connection> {
    let first_err = match duckdb::Connection::open(path) {
        Ok(conn) => return Ok(conn),
        Err(e) => e,
    };

    let wal_path = path.with_extension(match path.extension() {
        Some(ext) => format!("{}.wal", ext.to_string_lossy()),
        None => "wal".to_string(),
    });
    if !wal_path.exists() {
        return Err(first_err.into());
    }

    tracing::warn!(
        wal = %wal_path.display(),
        error = %first_err,
        "DuckDB open failed, removing stale WAL and retrying"
    );
    std::fs::remove_file(&wal_path)?;
    Ok(duckdb::Connection::open(path)?)
}
