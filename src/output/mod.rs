//! Output module for company records and crawl statistics
//!
//! This module handles:
//! - Writing records as JSON Lines
//! - Dropping duplicate records by their `(detail_url, name)` key
//! - Recording and printing crawl statistics

mod dedup;
mod jsonl;
pub mod stats;
mod traits;

pub use dedup::DedupSink;
pub use jsonl::JsonlWriter;
pub use stats::{print_statistics, CrawlCounters, CrawlStatistics};
pub use traits::{OutputError, OutputResult, RecordSink, VecSink, WriteOutcome};

use crate::record::Company;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// What the writer task did over a whole crawl
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SinkReport {
    pub written: u64,
    pub duplicates: u64,
}

/// Drains `records` into `sink` on a blocking thread
///
/// The task ends when every sender is dropped, then calls
/// [`RecordSink::finish`]. The first write error stops the task and closes
/// the channel, which makes further sends fail.
pub fn spawn_writer<S>(
    mut records: mpsc::Receiver<Company>,
    mut sink: S,
) -> JoinHandle<OutputResult<(S, SinkReport)>>
where
    S: RecordSink + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut report = SinkReport::default();

        while let Some(company) = records.blocking_recv() {
            match sink.write_record(&company)? {
                WriteOutcome::Written => report.written += 1,
                WriteOutcome::Duplicate => report.duplicates += 1,
            }
        }

        sink.finish()?;
        tracing::debug!(
            "Writer finished: {} written, {} duplicates",
            report.written,
            report.duplicates
        );
        Ok((sink, report))
    })
}
