//! Poll executor: one tick of a job.

use std::sync::Arc;

use chrono::Utc;
use modpoll_wire::{RegisterReader, TelemetryRegister, WireResult};
use tracing::{debug, error, info, warn};

use crate::model::{Job, JobExecution, Telemetry};
use crate::store::ExecutionStore;

/// Reads the telemetry registers of a job's device and records the outcome.
pub struct PollExecutor {
    reader: Arc<dyn RegisterReader>,
    executions: Arc<dyn ExecutionStore>,
}

impl PollExecutor {
    pub fn new(reader: Arc<dyn RegisterReader>, executions: Arc<dyn ExecutionStore>) -> Self {
        Self { reader, executions }
    }

    /// Run one tick for `job`.
    ///
    /// Reads cpu, ram and disk in order, stopping at the first failure.
    /// Exactly one execution is persisted per call whatever the outcome; a
    /// persistence failure is logged and the execution is still returned.
    pub async fn execute_tick(&self, job: &Job) -> JobExecution {
        let started = Utc::now();

        let execution = match self.read_telemetry(&job.target_address).await {
            Ok(telemetry) => {
                let execution = JobExecution::completed(job, started, telemetry);
                info!("Job {} executed. Status: {}", job.id, execution.status);
                execution
            }
            Err(e) => {
                let execution = JobExecution::failed(job, started, e.kind());
                warn!(
                    "Job {} executed. Status: {} ({}: {})",
                    job.id, execution.status, job.target_address, e
                );
                execution
            }
        };

        if let Err(e) = self.executions.append(&execution).await {
            error!("Failed to record execution {} of job {}: {}", execution.id, job.id, e);
        }
        execution
    }

    async fn read_telemetry(&self, address: &str) -> WireResult<Telemetry> {
        let cpu = self.read(address, TelemetryRegister::Cpu).await?;
        let ram = self.read(address, TelemetryRegister::Ram).await?;
        let disk = self.read(address, TelemetryRegister::Disk).await?;
        Ok(Telemetry::new(cpu, ram, disk))
    }

    async fn read(&self, address: &str, register: TelemetryRegister) -> WireResult<f64> {
        self.reader
            .read_register(address, register.address())
            .await
            .inspect_err(|e| {
                debug!("Reading {} from {} failed: {}", register.name(), address, e);
            })
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
