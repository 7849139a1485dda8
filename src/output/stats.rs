//! Crawl statistics
//!
//! Crawl tasks bump lock-free counters while they run; a
//! [`CrawlStatistics`] snapshot is taken once the crawl is over.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Live counters shared by every crawl task
#[derive(Debug, Default)]
pub struct CrawlCounters {
    pub listing_pages: AtomicU64,
    pub detail_pages: AtomicU64,
    pub companies_discovered: AtomicU64,
    pub fetch_failures: AtomicU64,
    pub requests_filtered: AtomicU64,
    pub records_emitted: AtomicU64,
    pages_per_letter: Mutex<BTreeMap<char, u32>>,
}

impl CrawlCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one to `counter`
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Adds `n` to `counter`
    pub fn add(counter: &AtomicU64, n: u64) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    /// Records the final page count of a finished letter
    pub fn finish_letter(&self, letter: char, pages: u32) {
        self.pages_per_letter
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(letter, pages);
    }

    /// Takes a snapshot of the counters
    pub fn snapshot(
        &self,
        started_at: DateTime<Utc>,
        records_written: u64,
        duplicate_records: u64,
    ) -> CrawlStatistics {
        CrawlStatistics {
            started_at,
            finished_at: Utc::now(),
            listing_pages_fetched: self.listing_pages.load(Ordering::Relaxed),
            detail_pages_fetched: self.detail_pages.load(Ordering::Relaxed),
            companies_discovered: self.companies_discovered.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            requests_filtered: self.requests_filtered.load(Ordering::Relaxed),
            records_emitted: self.records_emitted.load(Ordering::Relaxed),
            records_written,
            duplicate_records,
            pages_per_letter: self
                .pages_per_letter
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .clone(),
        }
    }
}

/// Crawl statistics summary
#[derive(Debug, Clone)]
pub struct CrawlStatistics {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    /// Listing pages successfully fetched
    pub listing_pages_fetched: u64,

    /// Detail pages successfully fetched and parsed
    pub detail_pages_fetched: u64,

    /// Company links found across all listing pages (duplicates included)
    pub companies_discovered: u64,

    /// Fetches that failed after the fetcher's own retries
    pub fetch_failures: u64,

    /// Requests dropped because their URL was already scheduled
    pub requests_filtered: u64,

    /// Records handed to the output sink
    pub records_emitted: u64,

    /// Records actually written
    pub records_written: u64,

    /// Records dropped by the `(detail_url, name)` dedup
    pub duplicate_records: u64,

    /// Listing pages fetched per letter
    pub pages_per_letter: BTreeMap<char, u32>,
}

impl CrawlStatistics {
    /// Wall-clock duration of the crawl in seconds
    pub fn duration_seconds(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds()
    }

    /// Share of issued fetches that succeeded, as a percentage
    pub fn success_rate(&self) -> f64 {
        let succeeded = self.listing_pages_fetched + self.detail_pages_fetched;
        let attempted = succeeded + self.fetch_failures;
        if attempted == 0 {
            return 0.0;
        }
        (succeeded as f64 / attempted as f64) * 100.0
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Run:");
    println!("  Started: {}", stats.started_at.to_rfc3339());
    println!("  Finished: {}", stats.finished_at.to_rfc3339());
    println!("  Duration: {}s", stats.duration_seconds());
    println!();

    println!("Fetches:");
    println!("  Listing pages: {}", stats.listing_pages_fetched);
    println!("  Detail pages: {}", stats.detail_pages_fetched);
    println!("  Failures: {}", stats.fetch_failures);
    println!("  Duplicate requests dropped: {}", stats.requests_filtered);
    println!();

    println!("Records:");
    println!("  Companies discovered: {}", stats.companies_discovered);
    println!("  Records emitted: {}", stats.records_emitted);
    println!("  Records written: {}", stats.records_written);
    println!("  Duplicate records dropped: {}", stats.duplicate_records);
    println!();

    if !stats.pages_per_letter.is_empty() {
        println!("Pages per Letter:");
        for (letter, pages) in &stats.pages_per_letter {
            println!("  {}: {}", letter, pages);
        }
        println!();
    }

    println!(
        "Success Rate: {:.1}% ({} / {} fetches succeeded)",
        stats.success_rate(),
        stats.listing_pages_fetched + stats.detail_pages_fetched,
        stats.listing_pages_fetched + stats.detail_pages_fetched + stats.fetch_failures
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_reads_counters() {
        let counters = CrawlCounters::new();
        CrawlCounters::bump(&counters.listing_pages);
        CrawlCounters::bump(&counters.listing_pages);
        CrawlCounters::bump(&counters.detail_pages);
        CrawlCounters::bump(&counters.fetch_failures);
        CrawlCounters::add(&counters.companies_discovered, 7);
        CrawlCounters::add(&counters.companies_discovered, 0);
        counters.finish_letter('B', 2);
        counters.finish_letter('A', 5);

        let stats = counters.snapshot(Utc::now(), 1, 0);

        assert_eq!(stats.listing_pages_fetched, 2);
        assert_eq!(stats.detail_pages_fetched, 1);
        assert_eq!(stats.fetch_failures, 1);
        assert_eq!(stats.companies_discovered, 7);
        assert_eq!(stats.records_written, 1);
        assert_eq!(
            stats.pages_per_letter.keys().copied().collect::<Vec<_>>(),
            vec!['A', 'B']
        );
    }

    #[test]
    fn test_success_rate() {
        let counters = CrawlCounters::new();
        for _ in 0..3 {
            CrawlCounters::bump(&counters.detail_pages);
        }
        CrawlCounters::bump(&counters.fetch_failures);

        let stats = counters.snapshot(Utc::now(), 0, 0);
        assert!((stats.success_rate() - 75.0).abs() < 0.01);
    }

    #[test]
    fn test_success_rate_zero_fetches() {
        let stats = CrawlCounters::new().snapshot(Utc::now(), 0, 0);
        assert_eq!(stats.success_rate(), 0.0);
        assert!(stats.duration_seconds() >= 0);
    }
}
