use serde::Deserialize;

/// Main configuration structure for the crawler
///
/// Every section is optional; a missing section takes its defaults, so an
/// empty file is a valid configuration that crawls doualazoom.com from 'A'.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Crawl traversal configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Letter to start the alphabetical traversal from
    ///
    /// Kept as the raw string; invalid values are coerced to 'A' by
    /// [`LetterCursor::from_config`](crate::state::LetterCursor::from_config).
    #[serde(rename = "start-letter")]
    pub start_letter: String,

    /// Maximum number of simultaneous in-flight fetches
    #[serde(rename = "max-concurrent-requests")]
    pub max_concurrent_requests: u32,

    /// Optional ceiling on listing pages fetched per letter
    #[serde(rename = "max-pages-per-letter")]
    pub max_pages_per_letter: Option<u32>,

    /// Drop requests for URLs that were already scheduled in this run
    #[serde(rename = "dedupe-requests")]
    pub dedupe_requests: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            start_letter: "A".to_string(),
            max_concurrent_requests: 10,
            max_pages_per_letter: None,
            dedupe_requests: true,
        }
    }
}

/// Target site description
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Base URL that listing paths and relative company links resolve against
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Substring identifying the site's own links (excluded from websites)
    #[serde(rename = "own-domain")]
    pub own_domain: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.doualazoom.com".to_string(),
            own_domain: "doualazoom.com".to_string(),
        }
    }
}

/// Fetch collaborator configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// User-Agent header sent on direct requests
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Per-request timeout (seconds)
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Additional attempts on transient failures
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Delay before the first retry, doubled on each further attempt (milliseconds)
    #[serde(rename = "retry-delay-ms")]
    pub retry_delay_ms: u64,

    /// Browser-rendering API used for rendered fetches
    #[serde(rename = "render-endpoint")]
    pub render_endpoint: Option<String>,

    /// Credential for the rendering API, sent as the basic-auth user
    #[serde(rename = "api-key")]
    pub api_key: Option<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("doualazoom-crawler/{}", env!("CARGO_PKG_VERSION")),
            timeout_secs: 30,
            max_retries: 2,
            retry_delay_ms: 1000,
            render_endpoint: None,
            api_key: None,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path of the JSON Lines file receiving company records
    pub path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: "companies.jsonl".to_string(),
        }
    }
}
