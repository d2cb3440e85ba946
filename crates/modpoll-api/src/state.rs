//! Application state.

use std::sync::Arc;
use std::time::Instant;

use modpoll_core::JobScheduler;

/// Application state shared across handlers.
pub struct AppState {
    pub scheduler: Arc<JobScheduler>,
    start_time: Instant,
}

impl AppState {
    pub fn new(scheduler: Arc<JobScheduler>) -> Self {
        Self {
            scheduler,
            start_time: Instant::now(),
        }
    }

    /// Get uptime.
    pub fn uptime(&self) -> std::time::Duration {
        self.start_time.elapsed()
    }

    /// Number of jobs with a live polling task.
    pub fn active_tasks(&self) -> usize {
        self.scheduler.registry().len()
    }
}
