//! Sitecrawl main entry point
//!
//! This is the command-line interface for the sitecrawl same-site crawler.

use anyhow::Context;
use clap::Parser;
use sitecrawl::config::{load_config, validate, Config};
use sitecrawl::output::{export_all, print_statistics};
use sitecrawl::{Crawler, Results};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Sitecrawl: a concurrent same-site web crawler
///
/// Sitecrawl crawls a single site from a seed URL with a bounded pool of
/// workers and a global request rate, then reports statistics and exports
/// the pages it found.
#[derive(Parser, Debug)]
#[command(name = "sitecrawl")]
#[command(version)]
#[command(about = "A concurrent same-site web crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Seed URL to start crawling from
    #[arg(short, long)]
    url: Option<String>,

    /// Maximum link depth from the seed
    #[arg(short, long)]
    depth: Option<u32>,

    /// Number of concurrent workers
    #[arg(short, long)]
    workers: Option<u32>,

    /// Requests per second across all workers
    #[arg(short, long)]
    rate: Option<u32>,

    /// Job queue capacity
    #[arg(long)]
    queue_capacity: Option<u32>,

    /// Per-request timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Directory for export files
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Skip writing export files
    #[arg(long)]
    no_export: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    /// Overlays command-line flags on top of the loaded configuration
    fn apply(&self, config: &mut Config) {
        if let Some(url) = &self.url {
            config.crawler.seed_url = url.clone();
        }
        if let Some(depth) = self.depth {
            config.crawler.max_depth = depth;
        }
        if let Some(workers) = self.workers {
            config.crawler.workers = workers;
        }
        if let Some(rate) = self.rate {
            config.crawler.requests_per_second = rate;
        }
        if let Some(capacity) = self.queue_capacity {
            config.crawler.queue_capacity = capacity;
        }
        if let Some(timeout) = self.timeout_ms {
            config.crawler.request_timeout_ms = timeout;
        }
        if let Some(dir) = &self.output_dir {
            config.output.directory = dir.clone();
        }
        if self.no_export {
            config.output.export = false;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)
                .with_context(|| format!("failed to load configuration from {}", path.display()))?
        }
        None => Config::default(),
    };
    cli.apply(&mut config);
    validate(&config).context("invalid configuration")?;

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_crawl(config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sitecrawl=info,warn"),
            1 => EnvFilter::new("sitecrawl=debug,info"),
            2 => EnvFilter::new("sitecrawl=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config) {
    println!("=== Sitecrawl Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Seed URL: {}", config.crawler.seed_url);
    println!("  Max depth: {}", config.crawler.max_depth);
    println!("  Workers: {}", config.crawler.workers);
    println!("  Requests per second: {}", config.crawler.requests_per_second);
    println!("  Queue capacity: {}", config.crawler.queue_capacity);
    println!("  Request timeout: {}ms", config.crawler.request_timeout_ms);
    println!(
        "  Termination: {} polls every {}ms",
        config.crawler.stable_polls, config.crawler.poll_interval_ms
    );

    println!("\nUser Agent: {}", config.user_agent.header_value());

    println!("\nOutput:");
    if config.output.export {
        println!("  JSON: {}", config.output.results_json_path().display());
        println!("  CSV: {}", config.output.results_csv_path().display());
        println!("  Links CSV: {}", config.output.links_csv_path().display());
    } else {
        println!("  Export disabled");
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config) -> anyhow::Result<()> {
    let results = Arc::new(Results::new());
    let crawler = Crawler::new(&config, Arc::clone(&results)).context("failed to set up crawler")?;

    let cancel = crawler.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping crawl");
            cancel.cancel();
        }
    });

    crawler
        .run()
        .await
        .with_context(|| format!("crawl of {} failed", config.crawler.seed_url))?;

    if crawler.is_cancelled() {
        tracing::info!("Crawl was interrupted; reporting partial results");
    }

    println!();
    print_statistics(&results.stats());

    if config.output.export {
        let written = export_all(&results, &config.output).context("failed to export results")?;
        for path in written {
            println!("✓ Wrote {}", path.display());
        }
    }

    Ok(())
}
