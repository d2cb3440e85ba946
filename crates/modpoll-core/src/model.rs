//! Jobs, executions and telemetry.

use std::fmt;

use chrono::{DateTime, Utc};
use modpoll_wire::FaultKind;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::Pagination;

/// Opaque job identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for JobId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Opaque execution identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionId(String);

impl ExecutionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Persisted job status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Running,
    Stopped,
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Running => f.write_str("RUNNING"),
            JobStatus::Stopped => f.write_str("STOPPED"),
        }
    }
}

/// A periodic poll of one device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: JobId,
    #[serde(rename = "targetIp")]
    pub target_address: String,
    pub cron_expression: String,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
}

/// A job that has not been persisted yet and so has no identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct JobDraft {
    pub target_address: String,
    pub cron_expression: String,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
}

impl JobDraft {
    /// A new RUNNING job created now.
    pub fn new(target_address: impl Into<String>, cron_expression: impl Into<String>) -> Self {
        Self {
            target_address: target_address.into(),
            cron_expression: cron_expression.into(),
            status: JobStatus::Running,
            created_at: Utc::now(),
        }
    }

    /// Attach the identifier assigned by the store.
    pub fn into_job(self, id: JobId) -> Job {
        Job {
            id,
            target_address: self.target_address,
            cron_expression: self.cron_expression,
            status: self.status,
            created_at: self.created_at,
        }
    }
}

/// Outcome of one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionStatus {
    Completed,
    ErrorTimeout,
    ErrorTcp,
    ErrorApp,
}

impl ExecutionStatus {
    pub fn is_error(self) -> bool {
        !matches!(self, ExecutionStatus::Completed)
    }
}

impl From<FaultKind> for ExecutionStatus {
    fn from(kind: FaultKind) -> Self {
        match kind {
            FaultKind::Timeout => ExecutionStatus::ErrorTimeout,
            FaultKind::Transport => ExecutionStatus::ErrorTcp,
            FaultKind::Protocol => ExecutionStatus::ErrorApp,
        }
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExecutionStatus::Completed => "COMPLETED",
            ExecutionStatus::ErrorTimeout => "ERROR_TIMEOUT",
            ExecutionStatus::ErrorTcp => "ERROR_TCP",
            ExecutionStatus::ErrorApp => "ERROR_APP",
        };
        f.write_str(name)
    }
}

/// Device gauges in percent, two-decimal precision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Telemetry {
    pub cpu: f64,
    pub ram: f64,
    pub disk: f64,
}

impl Telemetry {
    pub fn new(cpu: f64, ram: f64, disk: f64) -> Self {
        Self {
            cpu: round2(cpu),
            ram: round2(ram),
            disk: round2(disk),
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Append-only record of one tick.
///
/// Telemetry is present exactly when the status is COMPLETED. Build one with
/// [`JobExecution::completed`] or [`JobExecution::failed`], which keep that
/// pairing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobExecution {
    pub id: ExecutionId,
    pub job_id: JobId,
    #[serde(rename = "targetIp")]
    pub target_address: String,
    pub execution_time: DateTime<Utc>,
    pub status: ExecutionStatus,
    pub telemetry: Option<Telemetry>,
}

impl JobExecution {
    /// A successful tick.
    pub fn completed(job: &Job, execution_time: DateTime<Utc>, telemetry: Telemetry) -> Self {
        Self {
            id: ExecutionId::generate(),
            job_id: job.id.clone(),
            target_address: job.target_address.clone(),
            execution_time,
            status: ExecutionStatus::Completed,
            telemetry: Some(telemetry),
        }
    }

    /// A tick that failed with the given fault.
    pub fn failed(job: &Job, execution_time: DateTime<Utc>, fault: FaultKind) -> Self {
        Self {
            id: ExecutionId::generate(),
            job_id: job.id.clone(),
            target_address: job.target_address.clone(),
            execution_time,
            status: ExecutionStatus::from(fault),
            telemetry: None,
        }
    }
}

/// Job metadata together with one page of its execution history.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDetails {
    pub job_id: JobId,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub cron_expression: String,
    #[serde(rename = "targetIp")]
    pub target_address: String,
    pub executions: Vec<JobExecution>,
    pub pagination: Pagination,
}

#[cfg(test)]
#[path = "model_tests.rs"]
mod tests;
