//! Registry of live task handles.

use dashmap::DashMap;

use crate::model::JobId;
use crate::trigger::TaskHandle;

/// Concurrent map from job ID to the handle of its scheduled task.
///
/// Only says whether something is currently scheduled for a job; persisted
/// job status lives in the job store. Each operation is atomic per key.
#[derive(Default)]
pub struct TaskRegistry {
    tasks: DashMap<JobId, TaskHandle>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handle, returning the one it displaced, if any.
    pub fn put(&self, job_id: JobId, handle: TaskHandle) -> Option<TaskHandle> {
        self.tasks.insert(job_id, handle)
    }

    pub fn get(&self, job_id: &JobId) -> Option<TaskHandle> {
        self.tasks.get(job_id).map(|entry| entry.value().clone())
    }

    pub fn remove(&self, job_id: &JobId) -> Option<TaskHandle> {
        self.tasks.remove(job_id).map(|(_, handle)| handle)
    }

    pub fn contains(&self, job_id: &JobId) -> bool {
        self.tasks.contains_key(job_id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// IDs of all jobs with a live handle.
    pub fn job_ids(&self) -> Vec<JobId> {
        self.tasks.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Remove and return every handle.
    pub fn drain(&self) -> Vec<TaskHandle> {
        let ids = self.job_ids();
        ids.iter().filter_map(|id| self.remove(id)).collect()
    }
}
