//! Persistence for jobs and executions.

mod file;
mod memory;
mod page;

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::model::{Job, JobDraft, JobExecution, JobId};

pub use file::{FileExecutionStore, FileJobStore};
pub use memory::{MemoryExecutionStore, MemoryJobStore};
pub use page::{ExecutionPage, PageRequest, Pagination};

/// Job persistence.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Persist a new job, assigning its identifier.
    async fn create(&self, draft: JobDraft) -> StoreResult<Job>;

    /// Overwrite an existing job.
    async fn save(&self, job: &Job) -> StoreResult<Job>;

    /// Load a job by ID.
    async fn find_by_id(&self, id: &JobId) -> StoreResult<Option<Job>>;

    /// Load all jobs, oldest first.
    async fn find_all(&self) -> StoreResult<Vec<Job>>;
}

/// Append-only execution history.
#[async_trait]
pub trait ExecutionStore: Send + Sync {
    /// Record one execution.
    async fn append(&self, execution: &JobExecution) -> StoreResult<()>;

    /// One page of a job's executions, newest first.
    async fn find_by_job(&self, job_id: &JobId, page: PageRequest) -> StoreResult<ExecutionPage>;
}

/// Sort executions newest first. Ties keep the most recently appended first.
pub(crate) fn newest_first(mut executions: Vec<JobExecution>) -> Vec<JobExecution> {
    executions.reverse();
    executions.sort_by(|a, b| b.execution_time.cmp(&a.execution_time));
    executions
}
