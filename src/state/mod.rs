//! State module for tracking crawl run progress
//!
//! - `RunState`: lifecycle of a single crawl run (idle, running, draining, stopped)

mod run_state;

pub use run_state::RunState;
