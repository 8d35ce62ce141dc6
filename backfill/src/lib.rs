//! Backfill job that seals legacy plaintext message content at rest.
//!
//! The job walks the `messages` table in ascending id order, one page at a
//! time. For every row it asks the cipher whether the stored value is already
//! a token for the current key; rows that are not get sealed and written back
//! with a compare-and-swap on the content that was read. Rerunning the job is
//! a no-op, and an interrupted run can resume from the last reported cursor.

mod cancel;
mod error;
mod migrator;
mod report;

pub use cancel::CancelFlag;
pub use error::{BackfillError, BackfillResult};
pub use migrator::{Backfill, BackfillOptions, DEFAULT_PAGE_SIZE};
pub use report::{BackfillReport, RunStatus};
