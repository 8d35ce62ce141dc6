//! Matchday message backfill
//!
//! Seals every `messages.content` value that is still legacy plaintext.
//!
//! Usage:
//!   MESSAGE_ENCRYPTION_KEY=<64 hex chars> matchday-backfill --database matchday.duckdb
//!
//! Safe to rerun; rows that already open under the key are skipped. Ctrl-C
//! stops after the current page and prints the `--after` value to resume with.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use matchday_backfill::{
    Backfill, BackfillError, BackfillOptions, BackfillReport, CancelFlag, RunStatus,
};
use matchday_crypto::{ContentCipher, ContentKey, KEY_ENV_VAR};
use matchday_storage::MessageStore;
use matchday_types::MessageId;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Exit status when the run was interrupted and can be resumed.
const EXIT_CANCELLED: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "matchday-backfill")]
#[command(about = "Seal legacy plaintext direct messages at rest")]
struct Args {
    /// Path to the message database
    #[arg(short, long, env = "MATCHDAY_DATABASE")]
    database: PathBuf,

    /// Rows fetched per page
    #[arg(long, default_value = "500", value_parser = clap::value_parser!(u32).range(1..))]
    page_size: u32,

    /// Resume strictly after this message id
    #[arg(long, value_name = "MESSAGE_ID")]
    after: Option<MessageId>,

    /// Classify and count rows without writing anything
    #[arg(long)]
    dry_run: bool,

    /// Print the final report as JSON
    #[arg(long)]
    json: bool,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let key = ContentKey::from_env()
        .with_context(|| format!("{KEY_ENV_VAR} must hold a 64-character hex key"))?;
    let cipher = ContentCipher::new(&key);
    drop(key);

    let store = MessageStore::open(&args.database)
        .with_context(|| format!("failed to open {}", args.database.display()))?;
    info!(database = %args.database.display(), "message store opened");

    let options = BackfillOptions {
        page_size: usize::try_from(args.page_size).context("page size out of range")?,
        start_after: args.after,
        dry_run: args.dry_run,
    };

    let cancel = CancelFlag::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, stopping after the current page");
            on_signal.cancel();
        }
    });

    let job = Backfill::new(cipher, options).with_cancel_flag(cancel);
    let outcome = tokio::task::spawn_blocking(move || job.run(&store))
        .await
        .context("backfill task panicked")?;

    match outcome {
        Ok(report) => {
            print_report(&report, args.json)?;
            if report.status == RunStatus::Cancelled {
                print_resume_hint(&report);
                return Ok(ExitCode::from(EXIT_CANCELLED));
            }
            if !report.is_clean() {
                warn!(
                    conflicts = report.conflicts,
                    failed = report.failed,
                    "some legacy rows were left as plaintext; rerun to retry them"
                );
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            error!(error = %err, "backfill aborted");
            if let Some(report) = err.report() {
                print_report(report, args.json)?;
                print_resume_hint(report);
            }
            Err(fatal(err))
        }
    }
}

fn print_report(report: &BackfillReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        let mode = if report.dry_run { " (dry run)" } else { "" };
        println!("Backfill {:?}{mode}: {report}", report.status);
    }
    Ok(())
}

fn print_resume_hint(report: &BackfillReport) {
    match &report.last_cursor {
        Some(cursor) => eprintln!("Resume with: --after {cursor}"),
        None => eprintln!("No page completed; rerun from the start"),
    }
}

fn fatal(err: BackfillError) -> anyhow::Error {
    match err {
        BackfillError::Configuration { .. } => {
            anyhow::Error::new(err).context("content key rejected while sealing")
        }
        other => anyhow::Error::new(other),
    }
}
