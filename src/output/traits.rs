//! Record sink traits and error types
//!
//! A sink receives assembled company records one at a time. Sinks run on a
//! single writer task, so they take `&mut self` and need no locking.

use crate::record::Company;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to serialize record for {url}: {source}")]
    Serialize {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Writer task failed: {0}")]
    Task(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// What a sink did with a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The record was written
    Written,
    /// The record's key was already seen; it was silently dropped
    Duplicate,
}

/// Destination for company records
pub trait RecordSink {
    /// Writes one record
    fn write_record(&mut self, company: &Company) -> OutputResult<WriteOutcome>;

    /// Flushes any buffered output; called once after the last record
    fn finish(&mut self) -> OutputResult<()> {
        Ok(())
    }
}

/// In-memory sink collecting every record it receives
#[derive(Debug, Default)]
pub struct VecSink {
    pub records: Vec<Company>,
}

impl VecSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordSink for VecSink {
    fn write_record(&mut self, company: &Company) -> OutputResult<WriteOutcome> {
        self.records.push(company.clone());
        Ok(WriteOutcome::Written)
    }
}
