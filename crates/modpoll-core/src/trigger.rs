//! Cron-triggered recurring tasks.
//!
//! A [`TaskScheduler`] compiles a cron expression and runs a unit of work at
//! each fire time until the returned [`TaskHandle`] is cancelled.
//! [`CronTaskScheduler`] is the tokio implementation: one trigger loop per
//! task, with all ticks sharing a bounded pool of worker permits.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use cron::Schedule;
use futures::future::BoxFuture;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{SchedulerError, SchedulerResult};
use crate::model::JobId;

/// Future produced by one tick.
pub type TickFuture = BoxFuture<'static, ()>;

/// Unit of work run at every fire time.
pub type TickWork = Arc<dyn Fn() -> TickFuture + Send + Sync>;

/// Compile a cron expression.
///
/// The expression uses the six-field format
/// `second minute hour day_of_month month day_of_week`, with an optional
/// trailing year.
///
/// # Errors
///
/// Returns [`SchedulerError::InvalidSchedule`] if the expression is invalid.
pub fn compile(expression: &str) -> SchedulerResult<Schedule> {
    Schedule::from_str(expression).map_err(|e| SchedulerError::InvalidSchedule {
        expression: expression.to_string(),
        reason: e.to_string(),
    })
}

/// Schedules recurring work.
pub trait TaskScheduler: Send + Sync {
    /// Start running `work` on the schedule described by `cron_expression`.
    fn schedule(
        &self,
        job_id: &JobId,
        cron_expression: &str,
        work: TickWork,
    ) -> SchedulerResult<TaskHandle>;
}

struct HandleInner {
    job_id: JobId,
    cron_expression: String,
    schedule: Schedule,
    token: CancellationToken,
    created_at: DateTime<Utc>,
    fire_count: AtomicU64,
}

/// Cancellable reference to a scheduled recurring task.
///
/// Clones refer to the same task.
#[derive(Clone)]
pub struct TaskHandle {
    inner: Arc<HandleInner>,
}

impl TaskHandle {
    pub fn new(
        job_id: JobId,
        cron_expression: impl Into<String>,
        schedule: Schedule,
        token: CancellationToken,
    ) -> Self {
        Self {
            inner: Arc::new(HandleInner {
                job_id,
                cron_expression: cron_expression.into(),
                schedule,
                token,
                created_at: Utc::now(),
                fire_count: AtomicU64::new(0),
            }),
        }
    }

    pub fn job_id(&self) -> &JobId {
        &self.inner.job_id
    }

    pub fn cron_expression(&self) -> &str {
        &self.inner.cron_expression
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.inner.created_at
    }

    /// Signal the task to stop. Does not wait for an in-flight tick.
    pub fn cancel(&self) {
        self.inner.token.cancel();
        debug!("Task for job {} cancelled", self.inner.job_id);
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.token.is_cancelled()
    }

    /// Number of ticks started so far.
    pub fn fire_count(&self) -> u64 {
        self.inner.fire_count.load(Ordering::Relaxed)
    }

    /// Next scheduled fire time, if the task is still live.
    pub fn next_fire_time(&self) -> Option<DateTime<Utc>> {
        if self.is_cancelled() {
            return None;
        }
        self.inner.schedule.upcoming(Utc).next()
    }

    /// Whether both handles refer to the same task.
    pub fn same_task(&self, other: &TaskHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn record_fire(&self) {
        self.inner.fire_count.fetch_add(1, Ordering::Relaxed);
    }

    fn token(&self) -> &CancellationToken {
        &self.inner.token
    }

    fn schedule(&self) -> &Schedule {
        &self.inner.schedule
    }
}

impl fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHandle")
            .field("job_id", &self.inner.job_id)
            .field("cron_expression", &self.inner.cron_expression)
            .field("cancelled", &self.is_cancelled())
            .field("fire_count", &self.fire_count())
            .finish()
    }
}

/// Tokio-based cron scheduler with a bounded tick pool.
pub struct CronTaskScheduler {
    pool_size: usize,
    permits: Arc<Semaphore>,
}

impl CronTaskScheduler {
    /// Create a scheduler allowing at most `pool_size` concurrent ticks.
    pub fn new(pool_size: usize) -> Self {
        let pool_size = pool_size.max(1);
        Self {
            pool_size,
            permits: Arc::new(Semaphore::new(pool_size)),
        }
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Number of ticks that could start right now.
    pub fn available_workers(&self) -> usize {
        self.permits.available_permits()
    }
}

impl Default for CronTaskScheduler {
    fn default() -> Self {
        Self::new(5)
    }
}

impl TaskScheduler for CronTaskScheduler {
    fn schedule(
        &self,
        job_id: &JobId,
        cron_expression: &str,
        work: TickWork,
    ) -> SchedulerResult<TaskHandle> {
        let schedule = compile(cron_expression)?;
        let handle = TaskHandle::new(
            job_id.clone(),
            cron_expression,
            schedule,
            CancellationToken::new(),
        );

        tokio::spawn(run_trigger(handle.clone(), work, self.permits.clone()));
        debug!(
            "Scheduled job {} with '{}' (next fire: {:?})",
            job_id,
            cron_expression,
            handle.next_fire_time()
        );
        Ok(handle)
    }
}

/// Fire `work` at each scheduled time until the handle is cancelled.
///
/// Ticks of one task never overlap: the next fire time is computed after the
/// previous tick returns, so fire times missed while a tick was running are
/// skipped.
async fn run_trigger(handle: TaskHandle, work: TickWork, permits: Arc<Semaphore>) {
    let token = handle.token().clone();
    let mut last_fire: Option<DateTime<Utc>> = None;

    loop {
        let from = match last_fire {
            Some(last) => last.max(Utc::now()),
            None => Utc::now(),
        };
        let Some(next) = handle.schedule().after(&from).next() else {
            debug!("Job {} has no upcoming fire time", handle.job_id());
            break;
        };

        let delay = (next - Utc::now()).to_std().unwrap_or(Duration::ZERO);
        tokio::select! {
            _ = token.cancelled() => break,
            _ = tokio::time::sleep(delay) => {}
        }

        let permit = tokio::select! {
            _ = token.cancelled() => break,
            permit = permits.clone().acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => break,
            },
        };

        last_fire = Some(next);
        handle.record_fire();
        work().await;
        drop(permit);
    }

    debug!("Trigger loop for job {} exited", handle.job_id());
}

#[cfg(test)]
#[path = "trigger_tests.rs"]
mod tests;
