//! Crawler coordinator - main crawl orchestration logic
//!
//! Every letter from the start letter to 'Z' gets its own task. A letter
//! task walks its listing pages strictly in order (page N+1 is only
//! requested once page N has been parsed) and spawns one detail task per
//! company link without waiting for it. Letters run concurrently with each
//! other, and all fetches share the scheduler's global concurrency limit.
//!
//! Assembled records travel over a channel to a single writer task. The crawl
//! is done when every letter task has stopped paginating and drained its
//! detail tasks, and the writer has flushed.

use crate::config::Config;
use crate::crawler::fetcher::{FetchRequest, Fetcher};
use crate::crawler::parser::{parse_detail, parse_listing, ListingPage, SiteProfile};
use crate::crawler::scheduler::Scheduler;
use crate::output::{spawn_writer, CrawlCounters, CrawlStatistics, OutputError, RecordSink};
use crate::record::Company;
use crate::state::{coerce_start_letter, LetterCursor, LetterPhase, LetterProgress};
use crate::url::{listing_url, next_page_url};
use crate::CrawlerError;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use url::Url;

/// Records buffered between detail tasks and the writer
const RECORD_CHANNEL_CAPACITY: usize = 256;

/// Main crawler coordinator structure
pub struct Coordinator {
    fetcher: Arc<dyn Fetcher>,
    site: Arc<SiteProfile>,
    scheduler: Scheduler,
    cursor: LetterCursor,
    counters: Arc<CrawlCounters>,
}

/// Everything a crawl task needs, cheap to clone
#[derive(Clone)]
struct CrawlContext {
    fetcher: Arc<dyn Fetcher>,
    site: Arc<SiteProfile>,
    scheduler: Scheduler,
    counters: Arc<CrawlCounters>,
    records: mpsc::Sender<Company>,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `fetcher` - The fetch collaborator every request goes through
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(CrawlerError)` - The site base URL could not be parsed
    pub fn new(config: &Config, fetcher: Arc<dyn Fetcher>) -> Result<Self, CrawlerError> {
        let raw = &config.crawler.start_letter;
        let start = coerce_start_letter(raw);
        if *raw != start.to_string() {
            tracing::warn!(
                "Start letter {:?} is not a single uppercase letter, using 'A'",
                config.crawler.start_letter
            );
        }

        Ok(Self {
            fetcher,
            site: Arc::new(SiteProfile::from_config(&config.site)?),
            scheduler: Scheduler::new(&config.crawler),
            cursor: LetterCursor::new(start),
            counters: Arc::new(CrawlCounters::new()),
        })
    }

    /// The letter the crawl will start from
    pub fn start_letter(&self) -> Option<char> {
        self.cursor.current()
    }

    /// Runs the crawl to completion, writing records into `sink`
    ///
    /// Returns the sink (so callers can inspect in-memory sinks) together
    /// with the crawl statistics. Fetch failures never fail the run; only
    /// output errors and internal task failures do.
    pub async fn run<S>(self, sink: S) -> Result<(S, CrawlStatistics), CrawlerError>
    where
        S: RecordSink + Send + 'static,
    {
        let Coordinator {
            fetcher,
            site,
            scheduler,
            cursor,
            counters,
        } = self;

        let started_at = Utc::now();
        tracing::info!(
            "Starting crawl of {} from letter {:?} ({} letters)",
            site.base_url,
            cursor.current(),
            cursor.remaining()
        );

        let (tx, rx) = mpsc::channel(RECORD_CHANNEL_CAPACITY);
        let mut writer = spawn_writer(rx, sink);

        let ctx = CrawlContext {
            fetcher,
            site,
            scheduler,
            counters: Arc::clone(&counters),
            records: tx,
        };

        let mut letters = JoinSet::new();
        for letter in cursor {
            letters.spawn(ctx.clone().crawl_letter(letter));
        }
        drop(ctx);

        let mut writer_result = None;
        let mut first_error = None;
        loop {
            let joined = tokio::select! {
                joined = letters.join_next() => match joined {
                    Some(joined) => joined,
                    None => break,
                },
                finished = &mut writer, if writer_result.is_none() => {
                    if !matches!(finished, Ok(Ok(_))) {
                        tracing::error!("Record writer failed, aborting remaining letters");
                        letters.abort_all();
                    }
                    writer_result = Some(finished);
                    continue;
                }
            };

            match joined {
                Ok(Ok(progress)) => {
                    tracing::info!(
                        "Letter {} done: {} pages, {} companies",
                        progress.letter,
                        progress.pages_fetched,
                        progress.companies_found
                    );
                    counters.finish_letter(progress.letter, progress.pages_fetched);
                }
                Ok(Err(e)) => {
                    tracing::error!("Letter traversal failed: {}", e);
                    first_error.get_or_insert(e);
                }
                Err(e) if e.is_cancelled() => {}
                Err(e) => {
                    tracing::error!("Letter task failed: {}", e);
                    first_error.get_or_insert(CrawlerError::Task(e));
                }
            }
        }

        let finished = match writer_result {
            Some(finished) => finished,
            None => writer.await,
        };
        let (sink, report) = finished.map_err(|e| OutputError::Task(e.to_string()))??;

        if let Some(e) = first_error {
            return Err(e);
        }

        let stats = counters.snapshot(started_at, report.written, report.duplicates);
        tracing::info!(
            "Crawl completed: {} records written in {}s",
            stats.records_written,
            stats.duration_seconds()
        );

        Ok((sink, stats))
    }
}

impl CrawlContext {
    /// True once the writer task has dropped its end of the record channel
    fn writer_stopped(&self) -> bool {
        self.records.is_closed()
    }

    /// Walks every listing page of `letter`, then waits for its detail tasks
    async fn crawl_letter(self, letter: char) -> Result<LetterProgress, CrawlerError> {
        let mut progress = LetterProgress::new(letter);
        let mut details = JoinSet::new();
        let mut url = listing_url(&self.site.base_url, letter)?;

        loop {
            progress.transition(LetterPhase::FetchingListing)?;

            if self.writer_stopped() {
                tracing::warn!("Letter {}: record writer has stopped, abandoning letter", letter);
                break;
            }

            let Some(listing) = self.fetch_listing(url).await else {
                break;
            };
            progress.record_page(listing.company_links.len());

            if !listing.has_companies() {
                tracing::debug!(
                    "Letter {}: page {} lists no companies, stopping",
                    letter,
                    listing.page
                );
                break;
            }

            progress.transition(LetterPhase::FetchingDetail)?;
            for link in &listing.company_links {
                if self.writer_stopped() {
                    break;
                }
                self.dispatch_detail(&mut details, link.clone());
            }

            if progress.reached_cap(self.scheduler.max_pages_per_letter()) {
                tracing::warn!(
                    "Letter {}: page cap of {} reached while pages still list companies",
                    letter,
                    progress.pages_fetched
                );
                break;
            }

            progress.transition(LetterPhase::AdvancingPage)?;
            url = next_page_url(&listing.url);
        }

        progress.transition(LetterPhase::AdvancingLetter)?;

        while let Some(joined) = details.join_next().await {
            if let Err(e) = joined {
                tracing::error!("Detail task for letter {} failed: {}", letter, e);
            }
        }

        progress.transition(LetterPhase::Done)?;
        Ok(progress)
    }

    /// Fetches and parses one listing page
    ///
    /// Returns None when the request is filtered, the fetch fails or the
    /// writer has stopped; the letter then stops paginating.
    async fn fetch_listing(&self, url: Url) -> Option<ListingPage> {
        if !self.scheduler.admit(&url) {
            CrawlCounters::bump(&self.counters.requests_filtered);
            return None;
        }

        let scheduled = self.scheduler.acquire(FetchRequest::listing(url)).await?;
        if self.writer_stopped() {
            return None;
        }
        tracing::debug!("Fetching listing {}", scheduled.request.url);

        let page = match self.fetcher.fetch(&scheduled.request).await {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!("Listing fetch failed: {}", e);
                CrawlCounters::bump(&self.counters.fetch_failures);
                return None;
            }
        };
        drop(scheduled);

        CrawlCounters::bump(&self.counters.listing_pages);
        let listing = parse_listing(&page.body, &page.url, &self.site.base_url);
        CrawlCounters::add(
            &self.counters.companies_discovered,
            listing.company_links.len() as u64,
        );

        tracing::info!(
            "Listing {} (page {}): {} companies",
            listing.url,
            listing.page,
            listing.company_links.len()
        );
        Some(listing)
    }

    /// Spawns the detail task for `url` unless it was already requested
    fn dispatch_detail(&self, details: &mut JoinSet<()>, url: Url) {
        if !self.scheduler.admit(&url) {
            CrawlCounters::bump(&self.counters.requests_filtered);
            return;
        }

        details.spawn(self.clone().crawl_detail(url));
    }

    /// Fetches one detail page and hands its record to the writer
    async fn crawl_detail(self, url: Url) {
        let Some(scheduled) = self.scheduler.acquire(FetchRequest::detail(url)).await else {
            return;
        };
        if self.writer_stopped() {
            return;
        }
        tracing::debug!("Fetching detail {}", scheduled.request.url);

        let page = match self.fetcher.fetch(&scheduled.request).await {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!("Detail fetch failed: {}", e);
                CrawlCounters::bump(&self.counters.fetch_failures);
                return;
            }
        };
        drop(scheduled);

        CrawlCounters::bump(&self.counters.detail_pages);
        let detail = parse_detail(&page.body, page.url.as_str(), &self.site.own_domain);
        let company = Company::from_detail(detail);
        tracing::debug!("Extracted {:?} from {}", company.name, company.detail_url);

        if self.records.send(company).await.is_err() {
            tracing::warn!("Record writer has stopped, dropping record for {}", page.url);
            return;
        }
        CrawlCounters::bump(&self.counters.records_emitted);
    }
}
