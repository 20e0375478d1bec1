//! Terminal statistics report
//!
//! Renders the [`CrawlStats`] computed by the results sink.

use crate::output::CrawlStats;
use std::fmt::Write;

/// Renders statistics as a human-readable block
pub fn render_statistics(stats: &CrawlStats) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "=== Crawl Statistics ===\n");
    let _ = writeln!(out, "Pages crawled:    {}", stats.total);
    let _ = writeln!(out, "Unique links:     {}", stats.unique_links);
    let _ = writeln!(out, "Average time:     {:.2} ms", stats.avg_response_time_ms);
    let _ = writeln!(out, "Successful:       {}", stats.success_count);
    let _ = writeln!(out, "Failed:           {}", stats.fail_count);
    let _ = writeln!(out, "Crawl duration:   {:.2?}", stats.duration);

    let success_rate = if stats.total > 0 {
        (stats.success_count as f64 / stats.total as f64) * 100.0
    } else {
        0.0
    };

    let _ = writeln!(
        out,
        "\nSuccess Rate: {:.1}% ({} / {} pages successfully fetched)",
        success_rate, stats.success_count, stats.total
    );

    out
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CrawlStats) {
    print!("{}", render_statistics(stats));
}
