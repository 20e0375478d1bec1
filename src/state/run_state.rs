/// Run state definitions for tracking a crawl run's lifecycle
use std::fmt;

/// Represents the current state of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RunState {
    /// No run has been started yet
    #[default]
    Idle,

    /// Workers are fetching and the termination detector is watching
    Running,

    /// The queue is closed; workers finish buffered jobs and exit
    Draining,

    /// All workers have exited and the run duration is recorded
    Stopped,
}

impl RunState {
    /// Returns true while a run occupies the crawler
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Running | Self::Draining)
    }

    /// Returns true if a new run may be started from this state
    pub fn can_start(&self) -> bool {
        matches!(self, Self::Idle | Self::Stopped)
    }

    /// Checks if a transition from this state to another is valid
    ///
    /// # Valid Transitions
    ///
    /// - Idle → Running
    /// - Running → Draining
    /// - Draining → Stopped
    /// - Stopped → Running (a new run on the same crawler)
    pub fn can_transition_to(&self, target: RunState) -> bool {
        matches!(
            (self, target),
            (Self::Idle, Self::Running)
                | (Self::Running, Self::Draining)
                | (Self::Draining, Self::Stopped)
                | (Self::Stopped, Self::Running)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Draining => "draining",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
