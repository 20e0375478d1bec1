//! Crawler module for concurrent page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching and HTML metadata/link extraction
//! - Token-bucket rate limiting shared by all workers
//! - The visited set and the bounded job queue
//! - Termination detection and overall run coordination

mod coordinator;
mod fetcher;
mod monitor;
mod parser;
mod queue;
mod rate_limiter;
mod visited;
mod worker;

pub use coordinator::Crawler;
pub use fetcher::{build_http_client, FetchError, FetchedPage, Fetcher};
pub use monitor::{Progress, StabilityTracker, Termination, TerminationDetector};
pub use parser::{parse_html, PageInfo};
pub use queue::{EnqueueOutcome, Job, JobQueue};
pub use rate_limiter::{RateLimiter, MAX_REQUESTS_PER_SECOND};
pub use visited::VisitedSet;
pub use worker::{discover_children, enqueue_children, EnqueueSummary};

use crate::config::Config;
use crate::output::Results;
use crate::CrawlError;
use std::sync::Arc;

/// Runs a complete crawl from the configured seed
///
/// This is the main entry point for a one-shot crawl. It will:
/// 1. Validate the configuration and build the HTTP client
/// 2. Crawl from `config.crawler.seed_url` until convergence
/// 3. Return the populated results sink
///
/// # Arguments
///
/// * `config` - The crawler configuration
///
/// # Returns
///
/// * `Ok(results)` - Crawl ran to completion
/// * `Err(CrawlError)` - Configuration or seed was invalid
pub async fn crawl(config: Config) -> Result<Arc<Results>, CrawlError> {
    let results = Arc::new(Results::new());
    let crawler = Crawler::new(&config, Arc::clone(&results))?;
    crawler.run().await?;
    Ok(results)
}
