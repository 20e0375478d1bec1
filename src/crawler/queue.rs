//! Bounded job queue shared by all workers
//!
//! The queue is the only admission-control point of a run. Producers never
//! block: [`JobQueue::try_enqueue`] either buffers the job or reports that it
//! was dropped because the queue is at capacity. Blocking here could deadlock
//! a run in which every worker is trying to enqueue into a full queue and none
//! is consuming, so breadth is given up for liveness.

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use url::Url;

/// A unit of crawl work
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub url: Url,
    pub depth: u32,
}

impl Job {
    pub fn new(url: Url, depth: u32) -> Self {
        Self { url, depth }
    }

    /// The depth-0 job a run starts from
    pub fn seed(url: Url) -> Self {
        Self::new(url, 0)
    }
}

/// Result of a non-blocking enqueue attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// The job was buffered
    Queued,
    /// The queue was at capacity; the job was discarded
    Dropped,
    /// The queue no longer accepts jobs
    Closed,
}

/// Multi-producer, multi-consumer bounded queue with explicit close
#[derive(Debug)]
pub struct JobQueue {
    sender: mpsc::Sender<Job>,
    receiver: Mutex<mpsc::Receiver<Job>>,
    closed: CancellationToken,
}

impl JobQueue {
    /// Creates a queue holding at most `capacity` jobs
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0; configuration validation rejects that first.
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(capacity);
        Self {
            sender,
            receiver: Mutex::new(receiver),
            closed: CancellationToken::new(),
        }
    }

    /// Buffers `job` if there is room, otherwise drops it
    pub fn try_enqueue(&self, job: Job) -> EnqueueOutcome {
        if self.closed.is_cancelled() {
            return EnqueueOutcome::Closed;
        }

        match self.sender.try_send(job) {
            Ok(()) => EnqueueOutcome::Queued,
            Err(TrySendError::Full(_)) => EnqueueOutcome::Dropped,
            Err(TrySendError::Closed(_)) => EnqueueOutcome::Closed,
        }
    }

    /// Waits for the next job
    ///
    /// Returns None when `cancel` fires, or once the queue is closed and every
    /// buffered job has been handed out.
    pub async fn dequeue(&self, cancel: &CancellationToken) -> Option<Job> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            job = self.next_job() => job,
        }
    }

    async fn next_job(&self) -> Option<Job> {
        let mut receiver = self.receiver.lock().await;
        tokio::select! {
            biased;
            job = receiver.recv() => job,
            _ = self.closed.cancelled() => receiver.try_recv().ok(),
        }
    }

    /// Stops accepting new jobs; buffered jobs remain available to `dequeue`
    pub fn close(&self) {
        self.closed.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Number of buffered jobs
    pub fn len(&self) -> usize {
        self.sender.max_capacity() - self.sender.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.sender.max_capacity()
    }
}
