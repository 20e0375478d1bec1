//! HTTP fetcher implementation
//!
//! This module wraps the HTTP client and the HTML parser into a single
//! fetch-and-extract operation:
//! - Building the HTTP client with the configured user agent and timeout
//! - GET requests to fetch page content
//! - Error classification into per-job [`FetchError`]s

use crate::config::{CrawlerConfig, UserAgentConfig};
use crate::crawler::parser::{parse_html, PageInfo};
use reqwest::{redirect::Policy, Client};
use std::time::{Duration, Instant};
use thiserror::Error;
use url::Url;

/// Maximum redirect hops followed for a single fetch
const MAX_REDIRECTS: usize = 10;

/// Per-job fetch failures
///
/// These are recorded on the failed page result and never end the worker or
/// the run.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timeout")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("status {0}")]
    Status(u16),

    #[error("failed to read body: {0}")]
    Body(String),

    #[error("{0}")]
    Network(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else if e.is_connect() {
            FetchError::Connect(e.to_string())
        } else if e.is_body() || e.is_decode() {
            FetchError::Body(e.to_string())
        } else {
            FetchError::Network(e.to_string())
        }
    }
}

/// A page that was fetched and parsed
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub final_url: Url,
    /// HTTP status code
    pub status_code: u16,
    /// Time until the response headers arrived, excluding body and parse
    pub response_time: Duration,
    /// Extracted metadata and links
    pub info: PageInfo,
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `crawler` - Supplies the request timeout and the worker count used to
///   size the idle connection pool
/// * `user_agent` - The user agent configuration
///
/// # Example
///
/// ```no_run
/// use sitecrawl::config::Config;
/// use sitecrawl::crawler::build_http_client;
///
/// let config = Config::default();
/// let client = build_http_client(&config.crawler, &config.user_agent).unwrap();
/// ```
pub fn build_http_client(
    crawler: &CrawlerConfig,
    user_agent: &UserAgentConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(crawler.request_timeout())
        .connect_timeout(crawler.request_timeout().min(Duration::from_secs(10)))
        .pool_max_idle_per_host(crawler.workers as usize)
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetch-and-extract adapter used by the workers
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a fetcher from configuration
    pub fn from_config(
        crawler: &CrawlerConfig,
        user_agent: &UserAgentConfig,
    ) -> Result<Self, reqwest::Error> {
        build_http_client(crawler, user_agent).map(Self::new)
    }

    /// Fetches `url` and extracts its title, description and links
    ///
    /// # Errors
    ///
    /// | Condition | Error |
    /// |-----------|-------|
    /// | Request exceeds the client timeout | `Timeout` |
    /// | Connection refused / DNS / TLS failure | `Connect` |
    /// | Non-2xx status after redirects | `Status(code)` |
    /// | Body could not be read or decoded | `Body` |
    /// | Anything else from the client | `Network` |
    ///
    /// Links are resolved against the final URL after redirects.
    pub async fn fetch_page(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        let started = Instant::now();
        let response = self.client.get(url.clone()).send().await?;
        let response_time = started.elapsed();

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let final_url = response.url().clone();
        let body = response.text().await?;
        let info = parse_html(&body, &final_url);

        Ok(FetchedPage {
            final_url,
            status_code: status.as_u16(),
            response_time,
            info,
        })
    }
}
