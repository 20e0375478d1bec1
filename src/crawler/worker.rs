//! Worker loop and child-link discovery

use crate::crawler::coordinator::CrawlRun;
use crate::crawler::fetcher::FetchedPage;
use crate::crawler::queue::{EnqueueOutcome, Job, JobQueue};
use crate::crawler::visited::VisitedSet;
use crate::output::PageResult;
use crate::url::{in_scope, resolve_link};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use url::Url;

/// Counts from one batch of child enqueues
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnqueueSummary {
    pub queued: usize,
    pub dropped: usize,
}

/// Resolves a page's links and keeps the distinct ones in scope of `seed`
///
/// Malformed, non-navigational and cross-host links are silently discarded;
/// they were never fetched so they produce no page result.
pub fn discover_children(links: &[String], page_url: &Url, seed: &Url) -> Vec<Url> {
    let mut seen = HashSet::new();
    links
        .iter()
        .filter_map(|link| resolve_link(link, page_url))
        .filter(|url| in_scope(url, seed))
        .filter(|url| seen.insert(url.as_str().to_string()))
        .collect()
}

/// Offers each child to the queue without blocking
///
/// Children already claimed are skipped. A full queue drops the child; a
/// closed queue ends the batch.
pub fn enqueue_children(
    queue: &JobQueue,
    visited: &VisitedSet,
    children: Vec<Url>,
    depth: u32,
) -> EnqueueSummary {
    let mut summary = EnqueueSummary::default();

    for child in children {
        if visited.contains(child.as_str()) {
            continue;
        }

        match queue.try_enqueue(Job::new(child, depth)) {
            EnqueueOutcome::Queued => summary.queued += 1,
            EnqueueOutcome::Dropped => summary.dropped += 1,
            EnqueueOutcome::Closed => break,
        }
    }

    summary
}

/// Runs one worker until the queue is drained or the run is cancelled
pub(crate) async fn run_worker(id: usize, run: Arc<CrawlRun>) {
    tracing::trace!("[Worker {}] started", id);

    while let Some(job) = run.queue.dequeue(&run.cancel).await {
        if !process_job(id, &run, job).await {
            break;
        }
    }

    tracing::trace!("[Worker {}] exiting", id);
}

/// Processes a single job
///
/// Returns false when the worker should stop because the run was cancelled.
async fn process_job(id: usize, run: &CrawlRun, job: Job) -> bool {
    if run.cancel.is_cancelled() {
        return false;
    }

    if job.depth > run.max_depth {
        return true;
    }

    if !run.visited.try_claim(job.url.as_str()) {
        tracing::trace!("[Worker {}] Already visited: {}", id, job.url);
        return true;
    }

    let _in_flight = run.begin_job();

    if !run.limiter.acquire(&run.cancel).await {
        // no token only happens on shutdown; do not start the fetch
        return false;
    }

    let started = Instant::now();
    let outcome = tokio::select! {
        biased;
        _ = run.cancel.cancelled() => None,
        result = run.fetcher.fetch_page(&job.url) => Some(result),
    };
    let Some(outcome) = outcome else {
        tracing::debug!("[Worker {}] Fetch of {} abandoned on cancel", id, job.url);
        return false;
    };

    match outcome {
        Ok(FetchedPage {
            final_url,
            info,
            response_time,
            ..
        }) => {
            tracing::debug!(
                "[Worker {}] Crawled: {} (depth={}, links={}, {}ms)",
                id,
                job.url,
                job.depth,
                info.links.len(),
                response_time.as_millis()
            );

            let children = if job.depth < run.max_depth {
                discover_children(&info.links, &final_url, &run.seed)
            } else {
                Vec::new()
            };

            run.results.add_page(PageResult::success(
                job.url.as_str(),
                info.title.unwrap_or_default(),
                info.description.unwrap_or_default(),
                info.links,
                response_time,
            ));

            if !children.is_empty() {
                let summary = enqueue_children(&run.queue, &run.visited, children, job.depth + 1);
                if summary.dropped > 0 {
                    tracing::debug!(
                        "[Worker {}] Queue full, dropped {} links from {}",
                        id,
                        summary.dropped,
                        job.url
                    );
                }
                run.record_dropped(summary.dropped);
            }
        }
        Err(e) => {
            tracing::warn!("[Worker {}] Error fetching {}: {}", id, job.url, e);
            run.results
                .add_page(PageResult::failure(job.url.as_str(), &e, started.elapsed()));
        }
    }

    true
}
