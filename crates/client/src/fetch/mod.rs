//! HTTP page fetching for offline scans.
//!
//! When no saved HTML is available the CLI downloads the page itself.
//!
//! - URL canonicalization (see [`crate::page::canonicalize`])
//! - Max redirects: 5
//! - Max body bytes: 5MB (configurable)
//! - Non-2xx responses are errors

use reqwest::{Client, StatusCode, header};
use std::time::{Duration, Instant};
use yadz_core::{AppConfig, Error};

use crate::page::{Page, canonicalize};

/// Configuration for the page fetcher.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "yadz/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "yadz/0.1".to_string(),
            max_bytes: 5 * 1024 * 1024,
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
        }
    }
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self { user_agent: config.user_agent.clone(), max_bytes: config.max_page_bytes, ..Default::default() }
    }
}

/// A fetched page plus transfer metadata.
#[derive(Debug)]
pub struct FetchedPage {
    pub page: Page,
    /// HTTP status code
    pub status: StatusCode,
    /// Content-Type header
    pub content_type: Option<String>,
    /// Time taken to fetch in milliseconds
    pub fetch_ms: u64,
}

/// Downloads listing pages.
pub struct PageFetcher {
    http: Client,
    config: FetchConfig,
}

impl PageFetcher {
    /// Create a new fetcher with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::HttpError(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    /// Fetch `url_str` and parse it as a page.
    ///
    /// The page keeps the requested URL rather than the redirect target, since
    /// template dispatch is keyed on what the user asked for.
    pub async fn fetch(&self, url_str: &str) -> Result<FetchedPage, Error> {
        let start = Instant::now();
        let url = canonicalize(url_str).map_err(|e| Error::InvalidUrl(e.to_string()))?;

        let response = self
            .http
            .get(url.as_str())
            .header(header::ACCEPT, "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8")
            .send()
            .await
            .map_err(|e| Error::HttpError(format!("network error: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatus(status.as_u16()));
        }

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", len, self.config.max_bytes)));
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::HttpError(format!("failed to read response: {e}")))?;

        if bytes.len() > self.config.max_bytes {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", bytes.len(), self.config.max_bytes)));
        }

        let html = String::from_utf8_lossy(&bytes);
        let fetch_ms = start.elapsed().as_millis() as u64;

        tracing::debug!("fetched {} in {}ms ({} bytes)", url, fetch_ms, bytes.len());

        Ok(FetchedPage { page: Page::from_parts(url, &html), status, content_type, fetch_ms })
    }
}
