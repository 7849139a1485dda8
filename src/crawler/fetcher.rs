//! HTTP fetcher implementation
//!
//! The crawl core only knows the [`Fetcher`] trait: give it a URL and a
//! rendering mode, get back HTML and the URL it was finally served from.
//! [`HttpFetcher`] is the production implementation:
//!
//! - lightweight requests are plain GETs through `reqwest`
//! - rendered requests go to a browser-rendering API when one is configured
//!   (`fetch.render-endpoint`), and fall back to a plain GET otherwise
//! - transient failures are retried here, never in the crawl core
//!
//! # Retry Logic
//!
//! | Condition               | Action                               |
//! |-------------------------|--------------------------------------|
//! | HTTP 404 / other 4xx    | Immediate failure                    |
//! | HTTP 429                | Retry, delay doubles per attempt     |
//! | HTTP 5xx                | Retry, delay doubles per attempt     |
//! | Timeout / connect error | Retry, delay doubles per attempt     |
//! | Non-HTML content        | Immediate failure                    |

use crate::config::FetchConfig;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// How a page should be fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchMode {
    /// Raw server HTML, no JavaScript execution (listing pages)
    Lightweight,
    /// Browser-rendered HTML (detail pages)
    Rendered,
}

/// A single page request issued by the crawl core
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: Url,
    pub mode: FetchMode,
}

impl FetchRequest {
    /// Request for a listing page
    pub fn listing(url: Url) -> Self {
        Self {
            url,
            mode: FetchMode::Lightweight,
        }
    }

    /// Request for a company detail page
    pub fn detail(url: Url) -> Self {
        Self {
            url,
            mode: FetchMode::Rendered,
        }
    }
}

/// A fetched HTML document
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub url: Url,
    /// HTML body
    pub body: String,
}

/// Errors reported by a fetcher
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error for {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Expected HTML from {url}, got {content_type}")]
    ContentMismatch { url: String, content_type: String },

    #[error("Render service error for {url}: {message}")]
    Render { url: String, message: String },
}

impl FetchError {
    /// Returns true for failures worth retrying after a delay
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http { source, .. } => source.is_timeout() || source.is_connect(),
            Self::Status { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS.as_u16() || *status >= 500
            }
            Self::ContentMismatch { .. } | Self::Render { .. } => false,
        }
    }
}

/// The fetch collaborator used by the crawl core
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches one page
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchedPage, FetchError>;
}

/// Request body sent to the rendering API
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RenderRequest<'a> {
    url: &'a str,
    browser_html: bool,
}

/// Response body returned by the rendering API
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RenderResponse {
    url: Option<String>,
    browser_html: Option<String>,
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use doualazoom_crawler::config::FetchConfig;
/// use doualazoom_crawler::crawler::build_http_client;
///
/// let client = build_http_client(&FetchConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &FetchConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.timeout_secs.min(10)))
        .gzip(true)
        .brotli(true)
        .build()
}

/// `reqwest`-backed [`Fetcher`]
pub struct HttpFetcher {
    client: Client,
    config: FetchConfig,
}

impl HttpFetcher {
    /// Creates a fetcher; the configuration is fixed for its whole lifetime
    pub fn new(config: FetchConfig) -> Result<Self, reqwest::Error> {
        let client = build_http_client(&config)?;
        Ok(Self { client, config })
    }

    /// Plain GET of `url`
    async fn fetch_direct(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| FetchError::Http {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        let final_url = response.url().clone();

        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        if !content_type.is_empty() && !content_type.contains("html") {
            return Err(FetchError::ContentMismatch {
                url: url.to_string(),
                content_type,
            });
        }

        let body = response.text().await.map_err(|source| FetchError::Http {
            url: url.to_string(),
            source,
        })?;

        Ok(FetchedPage {
            url: final_url,
            body,
        })
    }

    /// Asks the rendering API for the browser HTML of `url`
    async fn fetch_rendered(&self, endpoint: &str, url: &Url) -> Result<FetchedPage, FetchError> {
        let mut builder = self.client.post(endpoint).json(&RenderRequest {
            url: url.as_str(),
            browser_html: true,
        });

        if let Some(api_key) = &self.config.api_key {
            builder = builder.basic_auth(api_key, Some(""));
        }

        let response = builder.send().await.map_err(|source| FetchError::Http {
            url: url.to_string(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let rendered: RenderResponse = response.json().await.map_err(|e| FetchError::Render {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        let body = rendered.browser_html.ok_or_else(|| FetchError::Render {
            url: url.to_string(),
            message: "response carried no browserHtml".to_string(),
        })?;

        let final_url = rendered
            .url
            .and_then(|u| Url::parse(&u).ok())
            .unwrap_or_else(|| url.clone());

        Ok(FetchedPage {
            url: final_url,
            body,
        })
    }

    async fn fetch_once(&self, request: &FetchRequest) -> Result<FetchedPage, FetchError> {
        match (request.mode, self.config.render_endpoint.as_deref()) {
            (FetchMode::Rendered, Some(endpoint)) => {
                self.fetch_rendered(endpoint, &request.url).await
            }
            (FetchMode::Rendered, None) => {
                tracing::trace!(
                    "No render endpoint configured, fetching {} directly",
                    request.url
                );
                self.fetch_direct(&request.url).await
            }
            (FetchMode::Lightweight, _) => self.fetch_direct(&request.url).await,
        }
    }

    /// Delay before retry number `attempt` (1-based)
    fn retry_delay(&self, attempt: u32) -> Duration {
        let factor = 1u64 << (attempt.saturating_sub(1)).min(10);
        Duration::from_millis(self.config.retry_delay_ms.saturating_mul(factor))
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchedPage, FetchError> {
        let mut attempt = 0u32;
        loop {
            match self.fetch_once(request).await {
                Ok(page) => return Ok(page),
                Err(e) if e.is_transient() && attempt < self.config.max_retries => {
                    attempt += 1;
                    let delay = self.retry_delay(attempt);
                    tracing::warn!(
                        "Transient error ({}), retry {}/{} in {:?}",
                        e,
                        attempt,
                        self.config.max_retries,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
