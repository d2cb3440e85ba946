//! Error types for the polling engine.

use thiserror::Error;

use crate::model::JobId;

/// Persistence errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Record to update does not exist.
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Generic error.
    #[error("{0}")]
    Custom(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors returned by job lifecycle operations.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// No job with this identifier is persisted.
    #[error("Job not found: {0}")]
    JobNotFound(JobId),

    /// Stop requested for a job with no live task.
    #[error("Job already stopped: {0}")]
    JobAlreadyStopped(JobId),

    /// Cron expression failed to compile.
    #[error("Invalid schedule '{expression}': {reason}")]
    InvalidSchedule { expression: String, reason: String },

    /// Persistence failure.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Result type for scheduler operations.
pub type SchedulerResult<T> = Result<T, SchedulerError>;
