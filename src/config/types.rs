use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for sitecrawl
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// URL the crawl starts from
    #[serde(rename = "seed-url")]
    pub seed_url: String,

    /// Number of concurrent workers
    pub workers: u32,

    /// Global outbound request budget (token bucket capacity and refill rate)
    #[serde(rename = "requests-per-second")]
    pub requests_per_second: u32,

    /// Maximum link depth from the seed (the seed is depth 0)
    #[serde(rename = "max-depth")]
    pub max_depth: u32,

    /// Capacity of the job queue; discovered links are dropped when it is full
    #[serde(rename = "queue-capacity")]
    pub queue_capacity: u32,

    /// Per-request timeout (milliseconds)
    #[serde(rename = "request-timeout-ms")]
    pub request_timeout_ms: u64,

    /// How often the termination detector samples progress (milliseconds)
    #[serde(rename = "poll-interval-ms")]
    pub poll_interval_ms: u64,

    /// Consecutive unchanged samples required before the crawl is declared converged
    #[serde(rename = "stable-polls")]
    pub stable_polls: u32,
}

impl CrawlerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            seed_url: "https://golang.org".to_string(),
            workers: 10,
            requests_per_second: 10,
            max_depth: 2,
            queue_capacity: 100,
            request_timeout_ms: 10_000,
            poll_interval_ms: 500,
            stable_polls: 3,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: Option<String>,
}

impl UserAgentConfig {
    /// Formats the User-Agent header value
    ///
    /// Format: `CrawlerName/Version` or `CrawlerName/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        match &self.contact_url {
            Some(contact) => format!(
                "{}/{} (+{})",
                self.crawler_name, self.crawler_version, contact
            ),
            None => format!("{}/{}", self.crawler_name, self.crawler_version),
        }
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "sitecrawl".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: None,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory the export files are written to
    pub directory: PathBuf,

    /// File name of the full JSON export
    #[serde(rename = "results-json")]
    pub results_json: String,

    /// File name of the per-page CSV summary
    #[serde(rename = "results-csv")]
    pub results_csv: String,

    /// File name of the one-row-per-link CSV
    #[serde(rename = "links-csv")]
    pub links_csv: String,

    /// Whether to write the export files after the crawl
    pub export: bool,
}

impl OutputConfig {
    pub fn results_json_path(&self) -> PathBuf {
        self.directory.join(&self.results_json)
    }

    pub fn results_csv_path(&self) -> PathBuf {
        self.directory.join(&self.results_csv)
    }

    pub fn links_csv_path(&self) -> PathBuf {
        self.directory.join(&self.links_csv)
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            results_json: "crawl_results.json".to_string(),
            results_csv: "crawl_results.csv".to_string(),
            links_csv: "crawl_links.csv".to_string(),
            export: true,
        }
    }
}
