use crate::output::traits::{OutputResult, RecordSink, WriteOutcome};
use crate::record::Company;
use std::collections::HashSet;

/// Sink wrapper that drops records whose `(detail_url, name)` was already written
///
/// Duplicates are reported as [`WriteOutcome::Duplicate`], never as errors.
pub struct DedupSink<S> {
    inner: S,
    seen: HashSet<(String, String)>,
    dropped: u64,
}

impl<S: RecordSink> DedupSink<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            seen: HashSet::new(),
            dropped: 0,
        }
    }

    /// Number of records dropped as duplicates
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: RecordSink> RecordSink for DedupSink<S> {
    fn write_record(&mut self, company: &Company) -> OutputResult<WriteOutcome> {
        let (url, name) = company.dedup_key();
        if self.seen.contains(&(url.to_string(), name.to_string())) {
            self.dropped += 1;
            tracing::debug!("Dropping duplicate record {:?} from {}", name, url);
            return Ok(WriteOutcome::Duplicate);
        }

        let outcome = self.inner.write_record(company)?;
        if outcome == WriteOutcome::Written {
            self.seen.insert((url.to_string(), name.to_string()));
        }
        Ok(outcome)
    }

    fn finish(&mut self) -> OutputResult<()> {
        self.inner.finish()
    }
}
