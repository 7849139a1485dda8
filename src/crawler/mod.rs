//! Crawler module for the company directory
//!
//! This module contains the core crawling logic, including:
//! - Fetching listing pages directly and detail pages through a renderer
//! - Parsing listing and detail pages
//! - Request scheduling and request dedup
//! - Letter-by-letter crawl coordination

mod coordinator;
mod fetcher;
mod parser;
mod scheduler;

pub use coordinator::Coordinator;
pub use fetcher::{
    build_http_client, FetchError, FetchMode, FetchRequest, FetchedPage, Fetcher, HttpFetcher,
};
pub use parser::{
    is_whatsapp_anchor, parse_detail, parse_listing, parse_page, visible_text, DetailPage,
    ListingPage, PageRole, ParsedPage, SiteProfile,
};
pub use scheduler::{ScheduledFetch, Scheduler};

use crate::config::Config;
use crate::output::{CrawlStatistics, DedupSink, JsonlWriter};
use crate::CrawlerError;
use std::path::Path;
use std::sync::Arc;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Build the HTTP fetcher
/// 2. Create the JSON Lines output file
/// 3. Walk every letter from the start letter to 'Z'
/// 4. Write one deduplicated record per company detail page
///
/// # Arguments
///
/// * `config` - The crawler configuration
///
/// # Returns
///
/// * `Ok(CrawlStatistics)` - Crawl completed
/// * `Err(CrawlerError)` - The fetcher or output file could not be set up, or writing failed
pub async fn crawl(config: Config) -> Result<CrawlStatistics, CrawlerError> {
    let fetcher = Arc::new(HttpFetcher::new(config.fetch.clone())?);
    let writer = JsonlWriter::create(Path::new(&config.output.path))?;
    tracing::info!("Writing records to {}", config.output.path);

    let coordinator = Coordinator::new(&config, fetcher)?;
    let (_, stats) = coordinator.run(DedupSink::new(writer)).await?;
    Ok(stats)
}
