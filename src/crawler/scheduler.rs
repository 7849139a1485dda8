//! Scheduler for request admission and concurrency limiting
//!
//! This module handles:
//! - Global concurrency limiting via a semaphore shared by every fetch
//! - Dropping requests for URLs already scheduled in this run
//! - The optional per-letter listing page ceiling

use crate::config::CrawlerConfig;
use crate::crawler::fetcher::FetchRequest;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use url::Url;

/// A request cleared to go out, holding its concurrency slot
///
/// The slot is released when this value is dropped.
pub struct ScheduledFetch {
    /// The request to issue
    pub request: FetchRequest,

    /// The semaphore permit for this fetch
    _permit: OwnedSemaphorePermit,
}

/// Scheduler shared by every crawl task
///
/// Cloning is cheap; all clones share the same semaphore and seen-set.
#[derive(Clone)]
pub struct Scheduler {
    /// Global semaphore for limiting concurrent fetches
    global_semaphore: Arc<Semaphore>,

    /// URLs already admitted in this run
    seen: Arc<Mutex<HashSet<String>>>,

    /// Whether repeated URLs are dropped
    dedupe_requests: bool,

    /// Optional ceiling on listing pages per letter
    max_pages_per_letter: Option<u32>,
}

impl Scheduler {
    /// Creates a new scheduler from the crawler configuration
    pub fn new(config: &CrawlerConfig) -> Self {
        Self {
            global_semaphore: Arc::new(Semaphore::new(config.max_concurrent_requests as usize)),
            seen: Arc::new(Mutex::new(HashSet::new())),
            dedupe_requests: config.dedupe_requests,
            max_pages_per_letter: config.max_pages_per_letter,
        }
    }

    /// Decides whether a request for `url` may be issued
    ///
    /// Returns false if request dedup is on and the URL was admitted before.
    /// The fragment is ignored when comparing URLs.
    pub fn admit(&self, url: &Url) -> bool {
        if !self.dedupe_requests {
            return true;
        }

        let mut key = url.clone();
        key.set_fragment(None);

        let mut seen = self.seen.lock().unwrap_or_else(|e| e.into_inner());
        let fresh = seen.insert(key.into());
        if !fresh {
            tracing::debug!("Dropping duplicate request for {}", url);
        }
        fresh
    }

    /// Waits for a free concurrency slot for `request`
    ///
    /// Returns None only if the semaphore was closed.
    pub async fn acquire(&self, request: FetchRequest) -> Option<ScheduledFetch> {
        let permit = self.global_semaphore.clone().acquire_owned().await.ok()?;
        Some(ScheduledFetch {
            request,
            _permit: permit,
        })
    }

    /// The configured per-letter page ceiling
    pub fn max_pages_per_letter(&self) -> Option<u32> {
        self.max_pages_per_letter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    fn create_test_config() -> CrawlerConfig {
        CrawlerConfig {
            start_letter: "A".to_string(),
            max_concurrent_requests: 2,
            max_pages_per_letter: Some(5),
            dedupe_requests: true,
        }
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_admit_drops_repeats() {
        let scheduler = Scheduler::new(&create_test_config());

        assert!(scheduler.admit(&url("https://x.com/fr/entreprise/1")));
        assert!(!scheduler.admit(&url("https://x.com/fr/entreprise/1")));
        assert!(!scheduler.admit(&url("https://x.com/fr/entreprise/1#contact")));
        assert!(scheduler.admit(&url("https://x.com/fr/entreprise/2")));
    }

    #[test]
    fn test_admit_without_dedupe() {
        let mut config = create_test_config();
        config.dedupe_requests = false;
        let scheduler = Scheduler::new(&config);

        assert!(scheduler.admit(&url("https://x.com/a")));
        assert!(scheduler.admit(&url("https://x.com/a")));
    }

    #[test]
    fn test_clones_share_seen_set() {
        let scheduler = Scheduler::new(&create_test_config());
        let other = scheduler.clone();

        assert!(scheduler.admit(&url("https://x.com/a")));
        assert!(!other.admit(&url("https://x.com/a")));
    }

    #[tokio::test]
    async fn test_acquire_limits_concurrency() {
        let scheduler = Scheduler::new(&create_test_config());
        let request = FetchRequest::listing(url("https://x.com/a"));

        let first = scheduler.acquire(request.clone()).await.unwrap();
        let second = scheduler.acquire(request.clone()).await.unwrap();

        // Both slots taken: a third request has to wait
        let blocked = timeout(Duration::from_millis(20), scheduler.acquire(request.clone())).await;
        assert!(blocked.is_err());

        drop(first);
        let third = timeout(Duration::from_millis(20), scheduler.acquire(request)).await;
        assert!(matches!(third, Ok(Some(_))));
        drop(second);
    }

    #[test]
    fn test_page_cap_exposed() {
        let scheduler = Scheduler::new(&create_test_config());
        assert_eq!(scheduler.max_pages_per_letter(), Some(5));
    }
}
