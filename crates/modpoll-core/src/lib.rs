//! # Modpoll Core
//!
//! The polling engine: jobs, their cron-triggered tasks, and the executions
//! each tick records.
//!
//! ## Architecture
//!
//! ```text
//! JobScheduler ──create/stop/update──► JobStore (system of record)
//!      │
//!      ├──► TaskRegistry (job id → live TaskHandle, at most one per job)
//!      │
//!      └──► TaskScheduler (cron trigger, bounded tick pool)
//!                 │ tick
//!                 ▼
//!           PollExecutor ──3 reads──► RegisterReader (device)
//!                 │
//!                 └──► ExecutionStore (append-only)
//! ```

pub mod error;
pub mod executor;
pub mod model;
pub mod registry;
pub mod scheduler;
pub mod store;
pub mod trigger;

pub use error::{SchedulerError, SchedulerResult, StoreError, StoreResult};
pub use executor::PollExecutor;
pub use model::{
    ExecutionId, ExecutionStatus, Job, JobDetails, JobDraft, JobExecution, JobId, JobStatus,
    Telemetry,
};
pub use registry::TaskRegistry;
pub use scheduler::JobScheduler;
pub use store::{
    ExecutionPage, ExecutionStore, FileExecutionStore, FileJobStore, JobStore,
    MemoryExecutionStore, MemoryJobStore, PageRequest, Pagination,
};
pub use trigger::{compile, CronTaskScheduler, TaskHandle, TaskScheduler, TickFuture, TickWork};
