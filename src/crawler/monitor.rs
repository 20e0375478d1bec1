//! Termination detection
//!
//! A queue fed by its own consumers has no natural end: it can be empty for a
//! moment while a worker is about to push more work. The detector samples the
//! visited-set size on a fixed cadence and declares the run converged after
//! `stable_polls` consecutive samples with no growth and no worker mid-job.
//! This is a heuristic with a latency tail of roughly
//! `stable_polls * poll_interval`, traded for not needing a barrier among
//! workers.

use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Why the detector returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// No progress was observed for the required number of polls
    Converged,
    /// The run's cancellation signal fired
    Cancelled,
}

/// A progress sample taken by the detector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Number of claimed URLs
    pub visited: usize,
    /// Number of workers currently processing a job
    pub in_flight: usize,
}

/// Counts consecutive unchanged samples
#[derive(Debug, Clone)]
pub struct StabilityTracker {
    previous: usize,
    stable: u32,
    required: u32,
}

impl StabilityTracker {
    pub fn new(required: u32) -> Self {
        Self {
            previous: 0,
            stable: 0,
            required: required.max(1),
        }
    }

    /// Records a sample and returns true once the run has converged
    pub fn observe(&mut self, progress: Progress) -> bool {
        if progress.visited == self.previous && progress.in_flight == 0 {
            self.stable += 1;
        } else {
            self.stable = 0;
        }
        self.previous = progress.visited;

        self.stable >= self.required
    }

    pub fn stable_polls(&self) -> u32 {
        self.stable
    }
}

/// Polling termination detector
#[derive(Debug, Clone)]
pub struct TerminationDetector {
    poll_interval: Duration,
    stable_polls: u32,
}

impl TerminationDetector {
    pub fn new(poll_interval: Duration, stable_polls: u32) -> Self {
        Self {
            poll_interval,
            stable_polls,
        }
    }

    /// Polls `sample` until the run converges or `cancel` fires
    ///
    /// Cancellation pre-empts the detector immediately, whatever the polling
    /// state.
    pub async fn wait<F>(&self, cancel: &CancellationToken, mut sample: F) -> Termination
    where
        F: FnMut() -> Progress,
    {
        let mut ticker = interval_at(Instant::now() + self.poll_interval, self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut tracker = StabilityTracker::new(self.stable_polls);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Termination::Cancelled,
                _ = ticker.tick() => {
                    let progress = sample();
                    if tracker.observe(progress) {
                        tracing::debug!(
                            "No progress for {} polls ({} URLs visited)",
                            tracker.stable_polls(),
                            progress.visited
                        );
                        return Termination::Converged;
                    }
                }
            }
        }
    }
}
