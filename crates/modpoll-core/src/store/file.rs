//! File system backed stores.
//!
//! Jobs are kept one pretty-printed JSON document per job under `jobs/`.
//! Executions are appended as JSON lines to one file per job under
//! `executions/`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::{newest_first, ExecutionPage, ExecutionStore, JobStore, PageRequest};
use crate::error::{StoreError, StoreResult};
use crate::model::{Job, JobDraft, JobExecution, JobId};

fn sanitize_id(id: &str) -> String {
    id.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

async fn ensure_dir(path: &Path) -> StoreResult<()> {
    fs::create_dir_all(path).await.map_err(|e| {
        StoreError::Custom(format!("Failed to create directory {:?}: {}", path, e))
    })
}

/// File system based job store.
pub struct FileJobStore {
    jobs_dir: PathBuf,
}

impl FileJobStore {
    /// Create a store rooted at `storage_path`.
    pub async fn new(storage_path: impl Into<PathBuf>) -> StoreResult<Self> {
        let jobs_dir = storage_path.into().join("jobs");
        ensure_dir(&jobs_dir).await?;

        debug!("FileJobStore initialized at {:?}", jobs_dir);
        Ok(Self { jobs_dir })
    }

    fn job_path(&self, id: &JobId) -> PathBuf {
        self.jobs_dir
            .join(format!("{}.json", sanitize_id(id.as_str())))
    }

    async fn write(&self, job: &Job) -> StoreResult<()> {
        let path = self.job_path(&job.id);
        let content = serde_json::to_string_pretty(job)?;
        fs::write(&path, content).await?;
        debug!("Saved job '{}' to {:?}", job.id, path);
        Ok(())
    }
}

#[async_trait]
impl JobStore for FileJobStore {
    async fn create(&self, draft: JobDraft) -> StoreResult<Job> {
        let job = draft.into_job(JobId::generate());
        self.write(&job).await?;
        Ok(job)
    }

    async fn save(&self, job: &Job) -> StoreResult<Job> {
        if !fs::try_exists(self.job_path(&job.id)).await? {
            return Err(StoreError::NotFound(job.id.to_string()));
        }
        self.write(job).await?;
        Ok(job.clone())
    }

    async fn find_by_id(&self, id: &JobId) -> StoreResult<Option<Job>> {
        let path = self.job_path(id);
        if !fs::try_exists(&path).await? {
            return Ok(None);
        }

        let content = fs::read_to_string(&path).await?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    async fn find_all(&self) -> StoreResult<Vec<Job>> {
        let mut jobs = Vec::new();
        let mut entries = fs::read_dir(&self.jobs_dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }

            match fs::read_to_string(&path).await {
                Ok(content) => match serde_json::from_str::<Job>(&content) {
                    Ok(job) => jobs.push(job),
                    Err(e) => warn!("Failed to deserialize job from {:?}: {}", path, e),
                },
                Err(e) => warn!("Failed to read job file {:?}: {}", path, e),
            }
        }

        jobs.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        debug!("Loaded {} jobs from {:?}", jobs.len(), self.jobs_dir);
        Ok(jobs)
    }
}

/// File system based execution store.
pub struct FileExecutionStore {
    executions_dir: PathBuf,
    append_lock: Mutex<()>,
}

impl FileExecutionStore {
    /// Create a store rooted at `storage_path`.
    pub async fn new(storage_path: impl Into<PathBuf>) -> StoreResult<Self> {
        let executions_dir = storage_path.into().join("executions");
        ensure_dir(&executions_dir).await?;

        debug!("FileExecutionStore initialized at {:?}", executions_dir);
        Ok(Self {
            executions_dir,
            append_lock: Mutex::new(()),
        })
    }

    fn history_path(&self, job_id: &JobId) -> PathBuf {
        self.executions_dir
            .join(format!("{}.jsonl", sanitize_id(job_id.as_str())))
    }
}

#[async_trait]
impl ExecutionStore for FileExecutionStore {
    async fn append(&self, execution: &JobExecution) -> StoreResult<()> {
        let mut line = serde_json::to_string(execution)?;
        line.push('\n');

        let _guard = self.append_lock.lock().await;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.history_path(&execution.job_id))
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    async fn find_by_job(&self, job_id: &JobId, page: PageRequest) -> StoreResult<ExecutionPage> {
        let path = self.history_path(job_id);
        if !fs::try_exists(&path).await? {
            return Ok(ExecutionPage::slice(Vec::new(), page));
        }

        let content = fs::read_to_string(&path).await?;
        let mut history = Vec::new();
        for (number, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<JobExecution>(line) {
                Ok(execution) => history.push(execution),
                Err(e) => warn!("Skipping line {} of {:?}: {}", number + 1, path, e),
            }
        }

        Ok(ExecutionPage::slice(newest_first(history), page))
    }
}

#[cfg(test)]
#[path = "file_tests.rs"]
mod tests;
