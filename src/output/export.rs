//! JSON and CSV exporters over a results snapshot

use crate::config::OutputConfig;
use crate::output::Results;
use crate::CrawlError;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Writes every recorded page as a pretty-printed JSON array
pub fn export_json(results: &Results, path: &Path) -> Result<(), CrawlError> {
    let pages = results.pages();
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, &pages)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Writes a one-row-per-page CSV summary
pub fn export_csv(results: &Results, path: &Path) -> Result<(), CrawlError> {
    let mut writer = csv::Writer::from_path(path)?;

    writer.write_record([
        "URL",
        "Title",
        "Description",
        "Links Count",
        "Response Time (ms)",
        "Success",
        "Error",
    ])?;

    for page in results.pages() {
        let links_count = page.links.len().to_string();
        let response_ms = page.response_time.as_millis().to_string();
        let success = page.success.to_string();

        writer.write_record([
            page.url.as_str(),
            page.title.as_str(),
            page.description.as_str(),
            links_count.as_str(),
            response_ms.as_str(),
            success.as_str(),
            page.error.as_deref().unwrap_or(""),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Writes one row per link found on each successful page
///
/// The depth column is kept for compatibility with existing consumers and is
/// left empty; page results do not carry the depth they were crawled at.
pub fn export_links_csv(results: &Results, path: &Path) -> Result<(), CrawlError> {
    let mut writer = csv::Writer::from_path(path)?;

    writer.write_record(["Source URL", "Found Link", "Link Depth"])?;

    for page in results.pages().iter().filter(|page| page.success) {
        for link in &page.links {
            writer.write_record([page.url.as_str(), link.as_str(), ""])?;
        }
    }

    writer.flush()?;
    Ok(())
}

/// Writes all three exports into the configured directory
///
/// # Returns
///
/// The paths that were written, in JSON, CSV, links-CSV order
pub fn export_all(results: &Results, output: &OutputConfig) -> Result<Vec<PathBuf>, CrawlError> {
    std::fs::create_dir_all(&output.directory)?;

    let json_path = output.results_json_path();
    let csv_path = output.results_csv_path();
    let links_path = output.links_csv_path();

    export_json(results, &json_path)?;
    export_csv(results, &csv_path)?;
    export_links_csv(results, &links_path)?;

    tracing::info!(
        "Exported {} pages to {}",
        results.len(),
        output.directory.display()
    );

    Ok(vec![json_path, csv_path, links_path])
}
