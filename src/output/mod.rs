//! Output module: the results sink and everything that reads from it
//!
//! This module handles:
//! - Collecting page results from concurrent workers
//! - Computing crawl statistics
//! - Exporting results as JSON and CSV

mod export;
mod results;
pub mod stats;

pub use export::{export_all, export_csv, export_json, export_links_csv};
pub use results::{CrawlStats, PageResult, Results};
pub use stats::print_statistics;
