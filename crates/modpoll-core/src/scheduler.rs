//! Job lifecycle: create, stop and update, keeping the task registry in step
//! with persisted job status.

use std::sync::Arc;

use dashmap::DashMap;
use futures::FutureExt;
use modpoll_wire::RegisterReader;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

use crate::error::{SchedulerError, SchedulerResult};
use crate::executor::PollExecutor;
use crate::model::{Job, JobDetails, JobDraft, JobId, JobStatus};
use crate::registry::TaskRegistry;
use crate::store::{ExecutionStore, JobStore, PageRequest};
use crate::trigger::{TaskScheduler, TickWork};

/// Owns every transition of a job between RUNNING and STOPPED.
///
/// Operations on the same job ID are serialized through a per-ID lock, so
/// once an operation returns the registry and the persisted status agree and
/// at most one live handle exists for the job. Operations on different jobs
/// proceed in parallel. No lock is held while a tick talks to a device.
pub struct JobScheduler {
    jobs: Arc<dyn JobStore>,
    executions: Arc<dyn ExecutionStore>,
    executor: Arc<PollExecutor>,
    registry: Arc<TaskRegistry>,
    trigger: Arc<dyn TaskScheduler>,
    locks: DashMap<JobId, Arc<Mutex<()>>>,
}

impl JobScheduler {
    pub fn new(
        jobs: Arc<dyn JobStore>,
        executions: Arc<dyn ExecutionStore>,
        reader: Arc<dyn RegisterReader>,
        trigger: Arc<dyn TaskScheduler>,
        registry: Arc<TaskRegistry>,
    ) -> Self {
        let executor = Arc::new(PollExecutor::new(reader, executions.clone()));
        Self {
            jobs,
            executions,
            executor,
            registry,
            trigger,
            locks: DashMap::new(),
        }
    }

    pub fn registry(&self) -> &Arc<TaskRegistry> {
        &self.registry
    }

    /// Persist a new RUNNING job and schedule its polling task.
    ///
    /// An invalid cron expression is logged and the job is kept as RUNNING
    /// without a task.
    pub async fn create(
        &self,
        target_address: impl Into<String>,
        cron_expression: impl Into<String>,
    ) -> SchedulerResult<Job> {
        let job = self
            .jobs
            .create(JobDraft::new(target_address, cron_expression))
            .await?;

        let _lock = self.lock(&job.id).await;

        // A stop or update may have slipped in between persisting and locking.
        let job = self.find(&job.id).await?;
        if job.status == JobStatus::Running && !self.registry.contains(&job.id) {
            self.start_task(&job);
        }
        info!(
            "Job {} created for {} with '{}'",
            job.id, job.target_address, job.cron_expression
        );
        Ok(job)
    }

    pub async fn get(&self, job_id: &JobId) -> SchedulerResult<Job> {
        self.find(job_id).await
    }

    pub async fn list(&self) -> SchedulerResult<Vec<Job>> {
        Ok(self.jobs.find_all().await?)
    }

    /// Job metadata with one page of its executions, newest first.
    pub async fn details(&self, job_id: &JobId, page: PageRequest) -> SchedulerResult<JobDetails> {
        let job = self.find(job_id).await?;
        let page = self.executions.find_by_job(job_id, page).await?;

        Ok(JobDetails {
            job_id: job.id,
            status: job.status,
            created_at: job.created_at,
            cron_expression: job.cron_expression,
            target_address: job.target_address,
            executions: page.executions,
            pagination: page.pagination,
        })
    }

    /// Cancel a job's task and mark it STOPPED.
    ///
    /// With no live task the persisted status is still reconciled to STOPPED
    /// before [`SchedulerError::JobAlreadyStopped`] is returned. An in-flight
    /// tick is not waited for.
    pub async fn stop(&self, job_id: &JobId) -> SchedulerResult<Job> {
        let _lock = self.lock(job_id).await;

        let job = self.find(job_id).await?;
        self.stop_locked(job).await
    }

    /// Change a job's target and/or schedule, restarting it as needed.
    ///
    /// `None` and empty strings leave a field as it is. A running job with no
    /// changes keeps its task. Anything else ends with the job RUNNING under
    /// a freshly scheduled task.
    pub async fn update(
        &self,
        job_id: &JobId,
        target_address: Option<String>,
        cron_expression: Option<String>,
    ) -> SchedulerResult<Job> {
        let _lock = self.lock(job_id).await;

        let mut job = self.find(job_id).await?;
        let mut changed = false;
        if let Some(address) = target_address.filter(|a| !a.is_empty()) {
            changed |= address != job.target_address;
            job.target_address = address;
        }
        if let Some(cron) = cron_expression.filter(|c| !c.is_empty()) {
            changed |= cron != job.cron_expression;
            job.cron_expression = cron;
        }

        let running = self.registry.contains(job_id);
        if running && !changed {
            job.status = JobStatus::Running;
            return Ok(self.jobs.save(&job).await?);
        }

        if running {
            job = self.stop_locked(job).await?;
        }

        job.status = JobStatus::Running;
        let job = self.jobs.save(&job).await?;
        if self.start_task(&job) {
            info!(
                "Job {} rescheduled for {} with '{}'",
                job.id, job.target_address, job.cron_expression
            );
        }
        Ok(job)
    }

    /// Schedule every persisted RUNNING job that has no live task.
    ///
    /// Returns the number of tasks started.
    pub async fn resume(&self) -> SchedulerResult<usize> {
        let mut resumed = 0;
        for job in self.jobs.find_all().await? {
            if job.status != JobStatus::Running {
                continue;
            }

            let _lock = self.lock(&job.id).await;
            if !self.registry.contains(&job.id) && self.start_task(&job) {
                resumed += 1;
            }
        }

        info!("Resumed {} job(s)", resumed);
        Ok(resumed)
    }

    /// Cancel every live task without touching persisted status.
    ///
    /// Returns the number of tasks cancelled.
    pub fn shutdown(&self) -> usize {
        let handles = self.registry.drain();
        for handle in &handles {
            handle.cancel();
        }
        info!("Job scheduler shut down, {} task(s) cancelled", handles.len());
        handles.len()
    }

    async fn lock(&self, job_id: &JobId) -> JobLock<'_> {
        let mutex = self
            .locks
            .entry(job_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let mut lock = JobLock {
            locks: &self.locks,
            job_id: job_id.clone(),
            mutex,
            guard: None,
        };
        lock.guard = Some(lock.mutex.clone().lock_owned().await);
        lock
    }

    async fn find(&self, job_id: &JobId) -> SchedulerResult<Job> {
        self.jobs
            .find_by_id(job_id)
            .await?
            .ok_or_else(|| SchedulerError::JobNotFound(job_id.clone()))
    }

    /// Caller holds the job's lock.
    async fn stop_locked(&self, mut job: Job) -> SchedulerResult<Job> {
        let Some(handle) = self.registry.remove(&job.id) else {
            if job.status != JobStatus::Stopped {
                job.status = JobStatus::Stopped;
                self.jobs.save(&job).await?;
                debug!("Job {} had no task, status reconciled to STOPPED", job.id);
            }
            return Err(SchedulerError::JobAlreadyStopped(job.id));
        };

        handle.cancel();
        job.status = JobStatus::Stopped;
        let job = self.jobs.save(&job).await?;
        info!("Job {} stopped", job.id);
        Ok(job)
    }

    /// Schedule the polling task for `job` and register its handle.
    ///
    /// Caller holds the job's lock. Returns false when the schedule does not
    /// compile, in which case nothing is registered.
    fn start_task(&self, job: &Job) -> bool {
        let executor = self.executor.clone();
        let tick_job = job.clone();
        let work: TickWork = Arc::new(move || {
            let executor = executor.clone();
            let job = tick_job.clone();
            async move {
                executor.execute_tick(&job).await;
            }
            .boxed()
        });

        match self.trigger.schedule(&job.id, &job.cron_expression, work) {
            Ok(handle) => {
                if let Some(stale) = self.registry.put(job.id.clone(), handle) {
                    warn!("Job {} displaced a live task, cancelling it", job.id);
                    stale.cancel();
                }
                true
            }
            Err(e) => {
                warn!("Job {} left unscheduled: {}", job.id, e);
                false
            }
        }
    }
}

/// Exclusive hold on one job ID. Dropping the last hold removes the ID's
/// entry from the lock map, so unknown and finished IDs leave nothing behind.
struct JobLock<'a> {
    locks: &'a DashMap<JobId, Arc<Mutex<()>>>,
    job_id: JobId,
    mutex: Arc<Mutex<()>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for JobLock<'_> {
    fn drop(&mut self) {
        self.guard.take();
        // The map and this hold are the only references when nobody waits.
        self.locks.remove_if(&self.job_id, |_, mutex| {
            Arc::ptr_eq(mutex, &self.mutex) && Arc::strong_count(mutex) == 2
        });
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
