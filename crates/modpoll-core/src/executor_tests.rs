use super::*;
use crate::error::{StoreError, StoreResult};
use crate::model::{ExecutionStatus, JobDraft, JobId};
use crate::store::{ExecutionPage, MemoryExecutionStore, PageRequest};
use async_trait::async_trait;
use modpoll_wire::DeviceError;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Reader that replays scripted results and records which registers were read.
struct ScriptedReader {
    results: Mutex<VecDeque<WireResult<f64>>>,
    reads: Mutex<Vec<(String, u16)>>,
}

impl ScriptedReader {
    fn new(results: Vec<WireResult<f64>>) -> Self {
        Self {
            results: Mutex::new(results.into()),
            reads: Mutex::new(Vec::new()),
        }
    }

    fn reads(&self) -> Vec<(String, u16)> {
        self.reads.lock().unwrap().clone()
    }
}

#[async_trait]
impl RegisterReader for ScriptedReader {
    async fn read_register(&self, address: &str, register: u16) -> WireResult<f64> {
        self.reads
            .lock()
            .unwrap()
            .push((address.to_string(), register));
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(DeviceError::ShortResponse { received: 0 }))
    }
}

struct FailingStore;

#[async_trait]
impl ExecutionStore for FailingStore {
    async fn append(&self, _execution: &JobExecution) -> StoreResult<()> {
        Err(StoreError::Custom("disk full".to_string()))
    }

    async fn find_by_job(&self, _job_id: &JobId, page: PageRequest) -> StoreResult<ExecutionPage> {
        Ok(ExecutionPage::slice(Vec::new(), page))
    }
}

fn job() -> Job {
    JobDraft::new("10.0.0.5", "*/5 * * * * *").into_job(JobId::new("job-1"))
}

fn setup(results: Vec<WireResult<f64>>) -> (PollExecutor, Arc<ScriptedReader>, Arc<MemoryExecutionStore>) {
    let reader = Arc::new(ScriptedReader::new(results));
    let store = Arc::new(MemoryExecutionStore::new());
    let executor = PollExecutor::new(reader.clone(), store.clone());
    (executor, reader, store)
}

#[tokio::test]
async fn test_tick_completed() {
    let (executor, reader, store) = setup(vec![Ok(45.0), Ok(62.0), Ok(30.0)]);
    let job = job();

    let execution = executor.execute_tick(&job).await;

    assert_eq!(execution.status, ExecutionStatus::Completed);
    assert_eq!(execution.telemetry, Some(Telemetry::new(45.0, 62.0, 30.0)));
    assert_eq!(execution.target_address, "10.0.0.5");
    assert_eq!(
        reader.reads(),
        vec![
            ("10.0.0.5".to_string(), 0x04),
            ("10.0.0.5".to_string(), 0x06),
            ("10.0.0.5".to_string(), 0x08),
        ]
    );

    let page = store.find_by_job(&job.id, PageRequest::default()).await.unwrap();
    assert_eq!(page.executions, vec![execution]);
}

#[tokio::test]
async fn test_tick_short_circuits_on_timeout() {
    let (executor, reader, store) = setup(vec![
        Ok(45.0),
        Err(DeviceError::ReadTimeout { timeout_ms: 2000 }),
        Ok(30.0),
    ]);
    let job = job();

    let execution = executor.execute_tick(&job).await;

    assert_eq!(execution.status, ExecutionStatus::ErrorTimeout);
    assert!(execution.telemetry.is_none());
    assert_eq!(reader.reads().len(), 2);
    assert_eq!(store.count(&job.id).await, 1);
}

#[tokio::test]
async fn test_tick_connect_failure_is_tcp_error() {
    let (executor, reader, _store) = setup(vec![Err(DeviceError::Connect {
        address: "10.0.0.5".to_string(),
        source: std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused"),
    })]);

    let execution = executor.execute_tick(&job()).await;

    assert_eq!(execution.status, ExecutionStatus::ErrorTcp);
    assert!(execution.telemetry.is_none());
    assert_eq!(reader.reads().len(), 1);
}

#[tokio::test]
async fn test_tick_protocol_faults_are_app_errors() {
    let (executor, _reader, _store) = setup(vec![
        Ok(45.0),
        Ok(62.0),
        Err(DeviceError::ChecksumMismatch {
            computed: 0x1234,
            received: 0x4321,
        }),
    ]);
    assert_eq!(executor.execute_tick(&job()).await.status, ExecutionStatus::ErrorApp);

    let (executor, _reader, _store) = setup(vec![Err(DeviceError::ShortResponse { received: 5 })]);
    assert_eq!(executor.execute_tick(&job()).await.status, ExecutionStatus::ErrorApp);
}

#[tokio::test]
async fn test_tick_survives_store_failure() {
    let reader = Arc::new(ScriptedReader::new(vec![Ok(1.0), Ok(2.0), Ok(3.0)]));
    let executor = PollExecutor::new(reader, Arc::new(FailingStore));

    let execution = executor.execute_tick(&job()).await;
    assert_eq!(execution.status, ExecutionStatus::Completed);
}

#[tokio::test]
async fn test_each_tick_records_one_execution() {
    let (executor, _reader, store) = setup(vec![
        Ok(45.0),
        Ok(62.0),
        Ok(30.0),
        Err(DeviceError::ReadTimeout { timeout_ms: 10 }),
    ]);
    let job = job();

    executor.execute_tick(&job).await;
    executor.execute_tick(&job).await;
    assert_eq!(store.count(&job.id).await, 2);
}

/// Log sink shared between a test and its fmt subscriber.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn lines_with(&self, needle: &str) -> Vec<String> {
        String::from_utf8_lossy(&self.0.lock().unwrap())
            .lines()
            .filter(|line| line.contains(needle))
            .map(str::to_string)
            .collect()
    }
}

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn capture_logs() -> (CapturedLogs, tracing::subscriber::DefaultGuard) {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (logs, guard)
}

#[tokio::test]
async fn test_completed_tick_logs_info() {
    let (logs, _guard) = capture_logs();
    let (executor, _reader, _store) = setup(vec![Ok(45.0), Ok(62.0), Ok(30.0)]);

    executor.execute_tick(&job()).await;

    let lines = logs.lines_with("Job job-1 executed");
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("INFO"));
    assert!(lines[0].contains("Status: COMPLETED"));
    assert!(logs.lines_with("WARN").is_empty());
}

#[tokio::test]
async fn test_failed_tick_logs_one_warning() {
    let (logs, _guard) = capture_logs();
    let (executor, _reader, _store) = setup(vec![
        Ok(45.0),
        Err(DeviceError::ReadTimeout { timeout_ms: 2000 }),
    ]);

    executor.execute_tick(&job()).await;

    let lines = logs.lines_with("Job job-1 executed");
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("WARN"));
    assert!(lines[0].contains("Status: ERROR_TIMEOUT"));
    assert!(lines[0].contains("10.0.0.5"));
    assert_eq!(logs.lines_with("WARN").len(), 1);
    assert!(logs.lines_with("INFO").is_empty());
}
