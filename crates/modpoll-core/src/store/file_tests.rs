use super::*;
use crate::model::{JobStatus, Telemetry};
use chrono::{Duration, Utc};
use modpoll_wire::FaultKind;
use tempfile::TempDir;

#[test]
fn test_sanitize_id() {
    assert_eq!(sanitize_id("simple-job"), "simple-job");
    assert_eq!(sanitize_id("job_with_underscore"), "job_with_underscore");
    assert_eq!(sanitize_id("job/with/slashes"), "job_with_slashes");
    assert_eq!(sanitize_id("../escape"), "___escape");
}

#[tokio::test]
async fn test_file_job_store_create_and_load() {
    let temp_dir = TempDir::new().unwrap();
    let store = FileJobStore::new(temp_dir.path()).await.unwrap();

    let job = store
        .create(JobDraft::new("10.0.0.5", "*/5 * * * * *"))
        .await
        .unwrap();

    let loaded = store.find_by_id(&job.id).await.unwrap().unwrap();
    assert_eq!(loaded, job);
    assert!(temp_dir
        .path()
        .join("jobs")
        .join(format!("{}.json", job.id))
        .exists());
}

#[tokio::test]
async fn test_file_job_store_save_overwrites() {
    let temp_dir = TempDir::new().unwrap();
    let store = FileJobStore::new(temp_dir.path()).await.unwrap();
    let mut job = store
        .create(JobDraft::new("10.0.0.5", "*/5 * * * * *"))
        .await
        .unwrap();

    job.status = JobStatus::Stopped;
    job.target_address = "10.0.0.6".to_string();
    store.save(&job).await.unwrap();

    let loaded = store.find_by_id(&job.id).await.unwrap().unwrap();
    assert_eq!(loaded.status, JobStatus::Stopped);
    assert_eq!(loaded.target_address, "10.0.0.6");
}

#[tokio::test]
async fn test_file_job_store_save_unknown() {
    let temp_dir = TempDir::new().unwrap();
    let store = FileJobStore::new(temp_dir.path()).await.unwrap();
    let ghost = JobDraft::new("a", "* * * * * *").into_job(JobId::new("ghost"));
    assert!(matches!(
        store.save(&ghost).await.unwrap_err(),
        StoreError::NotFound(_)
    ));
}

#[tokio::test]
async fn test_file_job_store_find_all_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();
    {
        let store = FileJobStore::new(temp_dir.path()).await.unwrap();
        for i in 0..3 {
            store
                .create(JobDraft::new(format!("10.0.0.{}", i), "* * * * * *"))
                .await
                .unwrap();
        }
    }
    // Garbage next to the job files is ignored.
    std::fs::write(temp_dir.path().join("jobs").join("broken.json"), "{not json").unwrap();
    std::fs::write(temp_dir.path().join("jobs").join("notes.txt"), "hello").unwrap();

    let store = FileJobStore::new(temp_dir.path()).await.unwrap();
    let jobs = store.find_all().await.unwrap();
    assert_eq!(jobs.len(), 3);
}

#[tokio::test]
async fn test_file_job_store_missing() {
    let temp_dir = TempDir::new().unwrap();
    let store = FileJobStore::new(temp_dir.path()).await.unwrap();
    assert!(store
        .find_by_id(&JobId::new("missing"))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_file_execution_store_append_and_page() {
    let temp_dir = TempDir::new().unwrap();
    let store = FileExecutionStore::new(temp_dir.path()).await.unwrap();
    let job = JobDraft::new("10.0.0.5", "* * * * * *").into_job(JobId::new("job-1"));
    let base = Utc::now();

    store
        .append(&JobExecution::completed(
            &job,
            base,
            Telemetry::new(45.0, 62.0, 30.0),
        ))
        .await
        .unwrap();
    store
        .append(&JobExecution::failed(
            &job,
            base + Duration::seconds(5),
            FaultKind::Timeout,
        ))
        .await
        .unwrap();

    let page = store
        .find_by_job(&job.id, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.pagination.total_elements, 2);
    assert_eq!(page.executions[0].status.to_string(), "ERROR_TIMEOUT");
    assert!(page.executions[0].telemetry.is_none());
    assert_eq!(page.executions[1].telemetry.unwrap().ram, 62.0);
}

#[tokio::test]
async fn test_file_execution_store_unknown_job() {
    let temp_dir = TempDir::new().unwrap();
    let store = FileExecutionStore::new(temp_dir.path()).await.unwrap();
    let page = store
        .find_by_job(&JobId::new("nope"), PageRequest::default())
        .await
        .unwrap();
    assert!(page.executions.is_empty());
    assert!(page.pagination.first && page.pagination.last);
}
