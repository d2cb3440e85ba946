//! In-memory stores.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{newest_first, ExecutionPage, ExecutionStore, JobStore, PageRequest};
use crate::error::{StoreError, StoreResult};
use crate::model::{Job, JobDraft, JobExecution, JobId};

/// In-memory job store.
pub struct MemoryJobStore {
    jobs: RwLock<HashMap<JobId, Job>>,
}

impl MemoryJobStore {
    /// Create a new memory store.
    pub fn new() -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryJobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn create(&self, draft: JobDraft) -> StoreResult<Job> {
        let job = draft.into_job(JobId::generate());
        self.jobs.write().await.insert(job.id.clone(), job.clone());
        Ok(job)
    }

    async fn save(&self, job: &Job) -> StoreResult<Job> {
        let mut jobs = self.jobs.write().await;
        match jobs.get_mut(&job.id) {
            Some(slot) => {
                *slot = job.clone();
                Ok(job.clone())
            }
            None => Err(StoreError::NotFound(job.id.to_string())),
        }
    }

    async fn find_by_id(&self, id: &JobId) -> StoreResult<Option<Job>> {
        Ok(self.jobs.read().await.get(id).cloned())
    }

    async fn find_all(&self) -> StoreResult<Vec<Job>> {
        let mut jobs: Vec<Job> = self.jobs.read().await.values().cloned().collect();
        jobs.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(jobs)
    }
}

/// In-memory execution store.
pub struct MemoryExecutionStore {
    executions: RwLock<HashMap<JobId, Vec<JobExecution>>>,
}

impl MemoryExecutionStore {
    pub fn new() -> Self {
        Self {
            executions: RwLock::new(HashMap::new()),
        }
    }

    /// Number of executions recorded for a job.
    pub async fn count(&self, job_id: &JobId) -> usize {
        self.executions
            .read()
            .await
            .get(job_id)
            .map_or(0, Vec::len)
    }
}

impl Default for MemoryExecutionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExecutionStore for MemoryExecutionStore {
    async fn append(&self, execution: &JobExecution) -> StoreResult<()> {
        self.executions
            .write()
            .await
            .entry(execution.job_id.clone())
            .or_default()
            .push(execution.clone());
        Ok(())
    }

    async fn find_by_job(&self, job_id: &JobId, page: PageRequest) -> StoreResult<ExecutionPage> {
        let history = self
            .executions
            .read()
            .await
            .get(job_id)
            .cloned()
            .unwrap_or_default();
        Ok(ExecutionPage::slice(newest_first(history), page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{JobStatus, Telemetry};
    use chrono::{Duration, Utc};
    use modpoll_wire::FaultKind;

    #[tokio::test]
    async fn test_memory_job_store() {
        let store = MemoryJobStore::new();
        let job = store
            .create(JobDraft::new("10.0.0.5", "*/5 * * * * *"))
            .await
            .unwrap();

        let loaded = store.find_by_id(&job.id).await.unwrap();
        assert_eq!(loaded, Some(job.clone()));

        let mut stopped = job.clone();
        stopped.status = JobStatus::Stopped;
        store.save(&stopped).await.unwrap();
        let loaded = store.find_by_id(&job.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, JobStatus::Stopped);

        assert_eq!(store.find_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_memory_job_store_assigns_distinct_ids() {
        let store = MemoryJobStore::new();
        let a = store.create(JobDraft::new("a", "* * * * * *")).await.unwrap();
        let b = store.create(JobDraft::new("b", "* * * * * *")).await.unwrap();
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn test_memory_job_store_save_unknown() {
        let store = MemoryJobStore::new();
        let ghost = JobDraft::new("a", "* * * * * *").into_job(JobId::new("ghost"));
        let err = store.save(&ghost).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_memory_execution_store_orders_newest_first() {
        let store = MemoryExecutionStore::new();
        let job = JobDraft::new("10.0.0.5", "* * * * * *").into_job(JobId::new("job-1"));
        let base = Utc::now();

        for offset in [2, 0, 1] {
            let execution = JobExecution::completed(
                &job,
                base + Duration::seconds(offset),
                Telemetry::new(offset as f64, 0.0, 0.0),
            );
            store.append(&execution).await.unwrap();
        }
        store
            .append(&JobExecution::failed(&job, base - Duration::seconds(1), FaultKind::Protocol))
            .await
            .unwrap();

        let page = store.find_by_job(&job.id, PageRequest::new(0, 2)).await.unwrap();
        assert_eq!(page.pagination.total_elements, 4);
        assert_eq!(page.pagination.total_pages, 2);
        assert_eq!(page.executions.len(), 2);
        assert_eq!(page.executions[0].telemetry.unwrap().cpu, 2.0);
        assert_eq!(page.executions[1].telemetry.unwrap().cpu, 1.0);

        let page = store.find_by_job(&job.id, PageRequest::new(1, 2)).await.unwrap();
        assert!(page.pagination.last);
        assert!(page.executions[1].telemetry.is_none());
        assert_eq!(store.count(&job.id).await, 4);
    }

    #[tokio::test]
    async fn test_memory_execution_store_unknown_job_is_empty() {
        let store = MemoryExecutionStore::new();
        let page = store
            .find_by_job(&JobId::new("nope"), PageRequest::default())
            .await
            .unwrap();
        assert!(page.executions.is_empty());
        assert_eq!(page.pagination.total_elements, 0);
    }
}
