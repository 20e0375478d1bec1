//! Crawler coordinator - run orchestration and the run control surface
//!
//! A run moves through `Idle → Running → Draining → Stopped`:
//! - the seed job is queued, workers are spawned and the termination
//!   detector starts watching progress
//! - convergence or cancellation closes the queue; workers finish the
//!   buffered jobs (or exit immediately on cancellation)
//! - once every worker has exited the duration is recorded on the results
//!   sink and the run is stopped

use crate::config::{validate, Config, CrawlerConfig};
use crate::crawler::fetcher::Fetcher;
use crate::crawler::monitor::{Progress, Termination, TerminationDetector};
use crate::crawler::queue::{Job, JobQueue};
use crate::crawler::rate_limiter::RateLimiter;
use crate::crawler::visited::VisitedSet;
use crate::crawler::worker::run_worker;
use crate::output::Results;
use crate::state::RunState;
use crate::url::normalize_url;
use crate::CrawlError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Shared context of one crawl run
///
/// One instance per run, handed to every worker. Nothing here outlives the
/// run except the results sink.
#[derive(Debug)]
pub(crate) struct CrawlRun {
    pub(crate) seed: Url,
    pub(crate) max_depth: u32,
    pub(crate) cancel: CancellationToken,
    pub(crate) visited: VisitedSet,
    pub(crate) queue: JobQueue,
    pub(crate) limiter: RateLimiter,
    pub(crate) fetcher: Fetcher,
    pub(crate) results: Arc<Results>,
    in_flight: AtomicUsize,
    dropped: AtomicUsize,
}

/// Marks a worker as mid-job until dropped
pub(crate) struct InFlightGuard<'a>(&'a AtomicUsize);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl CrawlRun {
    fn new(
        seed: Url,
        config: &CrawlerConfig,
        cancel: CancellationToken,
        fetcher: Fetcher,
        results: Arc<Results>,
    ) -> Result<Self, CrawlError> {
        Ok(Self {
            seed,
            max_depth: config.max_depth,
            cancel,
            visited: VisitedSet::new(),
            queue: JobQueue::new(config.queue_capacity as usize),
            limiter: RateLimiter::new(config.requests_per_second)?,
            fetcher,
            results,
            in_flight: AtomicUsize::new(0),
            dropped: AtomicUsize::new(0),
        })
    }

    pub(crate) fn begin_job(&self) -> InFlightGuard<'_> {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        InFlightGuard(&self.in_flight)
    }

    pub(crate) fn record_dropped(&self, count: usize) {
        if count > 0 {
            self.dropped.fetch_add(count, Ordering::Relaxed);
        }
    }

    fn progress(&self) -> Progress {
        Progress {
            visited: self.visited.len(),
            in_flight: self.in_flight.load(Ordering::SeqCst),
        }
    }
}

/// Concurrent same-site crawler
///
/// Configuration is validated at construction, before any worker exists.
/// `start` runs one crawl to completion; `cancel` may be called from any task
/// at any time.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use sitecrawl::config::Config;
/// use sitecrawl::{Crawler, Results};
///
/// # async fn example() -> Result<(), sitecrawl::CrawlError> {
/// let results = Arc::new(Results::new());
/// let crawler = Crawler::new(&Config::default(), Arc::clone(&results))?;
/// crawler.start("https://example.com/").await?;
/// println!("{} pages", results.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Crawler {
    config: CrawlerConfig,
    fetcher: Fetcher,
    results: Arc<Results>,
    cancel: CancellationToken,
    state: watch::Sender<RunState>,
    last_dropped: AtomicUsize,
}

impl Crawler {
    /// Creates a crawler writing into `results`
    ///
    /// # Errors
    ///
    /// * `CrawlError::Config` - invalid worker count, rate, capacity or timing
    /// * `CrawlError::Reqwest` - the HTTP client could not be built
    pub fn new(config: &Config, results: Arc<Results>) -> Result<Self, CrawlError> {
        validate(config)?;
        let fetcher = Fetcher::from_config(&config.crawler, &config.user_agent)?;
        let (state, _) = watch::channel(RunState::Idle);

        Ok(Self {
            config: config.crawler.clone(),
            fetcher,
            results,
            cancel: CancellationToken::new(),
            state,
            last_dropped: AtomicUsize::new(0),
        })
    }

    pub fn results(&self) -> &Arc<Results> {
        &self.results
    }

    /// Current run state
    pub fn state(&self) -> RunState {
        *self.state.borrow()
    }

    /// Subscribes to run state changes
    pub fn subscribe(&self) -> watch::Receiver<RunState> {
        self.state.subscribe()
    }

    /// Cancels the current run and any later one
    ///
    /// Idempotent. Before a run, the next `start` stops right away; during a
    /// run, every worker abandons its current suspension point and the run
    /// reaches `Stopped` within the request timeout.
    pub fn cancel(&self) {
        if !self.cancel.is_cancelled() {
            tracing::info!("Cancellation requested");
        }
        self.cancel.cancel();
    }

    /// Links dropped on a full queue during the most recent run
    pub fn dropped_links(&self) -> usize {
        self.last_dropped.load(Ordering::Relaxed)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Token that cancels this crawler when fired, e.g. from a signal handler
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Crawls from the configured seed URL
    pub async fn run(&self) -> Result<(), CrawlError> {
        let seed = self.config.seed_url.clone();
        self.start(&seed).await
    }

    /// Crawls from `seed` and returns once the run has stopped
    ///
    /// # Errors
    ///
    /// * `CrawlError::InvalidSeed` - the seed is not an absolute http(s) URL
    /// * `CrawlError::AlreadyRunning` - another run on this crawler is active
    pub async fn start(&self, seed: &str) -> Result<(), CrawlError> {
        let seed_url = normalize_url(seed).map_err(|e| CrawlError::InvalidSeed {
            url: seed.to_string(),
            reason: e.to_string(),
        })?;

        let run = Arc::new(CrawlRun::new(
            seed_url.clone(),
            &self.config,
            self.cancel.child_token(),
            self.fetcher.clone(),
            Arc::clone(&self.results),
        )?);

        let claimed = self.state.send_if_modified(|state| {
            if state.can_start() {
                *state = RunState::Running;
                true
            } else {
                false
            }
        });
        if !claimed {
            return Err(CrawlError::AlreadyRunning);
        }

        let started = Instant::now();
        self.results.begin_run();
        tracing::info!(
            "Starting crawl of {} ({} workers, {} req/s, max depth {}, queue capacity {})",
            seed_url,
            self.config.workers,
            self.config.requests_per_second,
            self.config.max_depth,
            self.config.queue_capacity
        );

        run.queue.try_enqueue(Job::seed(seed_url));

        let mut workers = JoinSet::new();
        for id in 0..self.config.workers as usize {
            workers.spawn(run_worker(id, Arc::clone(&run)));
        }

        let detector =
            TerminationDetector::new(self.config.poll_interval(), self.config.stable_polls);
        match detector.wait(&run.cancel, || run.progress()).await {
            Termination::Converged => tracing::info!(
                "Crawl converged after {} URLs, draining workers",
                run.visited.len()
            ),
            Termination::Cancelled => tracing::info!("Crawl cancelled, draining workers"),
        }

        self.transition(RunState::Draining);
        run.queue.close();

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                tracing::error!("Worker task failed: {}", e);
            }
        }

        run.limiter.shutdown();
        let duration = started.elapsed();
        let dropped = run.dropped.load(Ordering::Relaxed);
        self.last_dropped.store(dropped, Ordering::Relaxed);
        self.results.finish_run(duration);
        self.transition(RunState::Stopped);

        tracing::info!(
            "All workers finished: {} pages recorded, {} URLs visited, {} links dropped, {:.2?}",
            self.results.len(),
            run.visited.len(),
            dropped,
            duration
        );

        Ok(())
    }

    fn transition(&self, next: RunState) {
        self.state.send_modify(|state| {
            if !state.can_transition_to(next) {
                tracing::warn!("Unexpected run state transition: {} -> {}", state, next);
            }
            *state = next;
        });
    }
}
