//! Thread-safe results sink
//!
//! Workers append one [`PageResult`] per completed fetch attempt; readers such
//! as the statistics report or the exporters take point-in-time snapshots.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

/// Outcome of one fetch attempt
#[derive(Debug, Clone, Serialize)]
pub struct PageResult {
    pub url: String,
    pub title: String,
    pub description: String,
    pub links: Vec<String>,
    #[serde(rename = "response_time_ms", serialize_with = "serialize_millis")]
    pub response_time: Duration,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub crawled_at: DateTime<Utc>,
}

impl PageResult {
    /// Creates a result for a page that was fetched and parsed
    pub fn success(
        url: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        links: Vec<String>,
        response_time: Duration,
    ) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            description: description.into(),
            links,
            response_time,
            success: true,
            error: None,
            crawled_at: Utc::now(),
        }
    }

    /// Creates a result for a failed fetch, preserving the error text
    pub fn failure(url: impl Into<String>, error: impl fmt::Display, response_time: Duration) -> Self {
        Self {
            url: url.into(),
            title: String::new(),
            description: String::new(),
            links: Vec::new(),
            response_time,
            success: false,
            error: Some(error.to_string()),
            crawled_at: Utc::now(),
        }
    }
}

fn serialize_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}

/// Aggregate statistics over the recorded pages
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrawlStats {
    pub total: usize,
    pub unique_links: usize,
    pub avg_response_time_ms: f64,
    pub success_count: usize,
    pub fail_count: usize,
    pub duration: Duration,
}

#[derive(Debug, Default)]
struct ResultsInner {
    pages: Vec<PageResult>,
    duration: Duration,
    complete: bool,
}

/// Append-only store of page results, safe under concurrent callers
#[derive(Debug, Default)]
pub struct Results {
    inner: RwLock<ResultsInner>,
}

impl Results {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, ResultsInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ResultsInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends a page result
    pub fn add_page(&self, page: PageResult) {
        self.write().pages.push(page);
    }

    /// Returns a point-in-time copy of all recorded pages, in append order
    pub fn pages(&self) -> Vec<PageResult> {
        self.read().pages.clone()
    }

    pub fn len(&self) -> usize {
        self.read().pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().pages.is_empty()
    }

    /// Calculates and returns statistics
    pub fn stats(&self) -> CrawlStats {
        let inner = self.read();

        let mut stats = CrawlStats {
            total: inner.pages.len(),
            duration: inner.duration,
            ..CrawlStats::default()
        };

        if stats.total == 0 {
            return stats;
        }

        let mut total_time = Duration::ZERO;
        let mut unique_links: HashSet<&str> = HashSet::new();

        for page in &inner.pages {
            total_time += page.response_time;
            if page.success {
                stats.success_count += 1;
            } else {
                stats.fail_count += 1;
            }
            unique_links.extend(page.links.iter().map(String::as_str));
        }

        stats.unique_links = unique_links.len();
        stats.avg_response_time_ms = total_time.as_secs_f64() * 1000.0 / stats.total as f64;

        stats
    }

    /// Marks the sink as receiving results for a new run
    pub fn begin_run(&self) {
        self.write().complete = false;
    }

    /// Records the run duration and marks the sink complete
    pub fn finish_run(&self, duration: Duration) {
        let mut inner = self.write();
        inner.duration = duration;
        inner.complete = true;
    }

    /// Returns true once the most recent run has stopped
    pub fn is_complete(&self) -> bool {
        self.read().complete
    }

    pub fn duration(&self) -> Duration {
        self.read().duration
    }
}
