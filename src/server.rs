//! Server initialization and startup logic for modpoll.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use modpoll_api::{ApiConfig, ApiServer, AppState};
use modpoll_config::{Config, ConfigLoader, ConfigValidator, LoggingConfig, StorageConfig};
use modpoll_core::{
    CronTaskScheduler, ExecutionStore, FileExecutionStore, FileJobStore, JobScheduler, JobStore,
    MemoryExecutionStore, MemoryJobStore, TaskRegistry,
};
use modpoll_wire::{ClientConfig, TcpDeviceClient};

const DEFAULT_CONFIG_PATH: &str = "config/modpoll.toml";

/// Config file used when none is given on the command line.
fn default_config_path() -> Option<PathBuf> {
    let local = PathBuf::from(DEFAULT_CONFIG_PATH);
    if local.exists() {
        return Some(local);
    }
    dirs::config_dir()
        .map(|dir| dir.join("modpoll").join("modpoll.toml"))
        .filter(|path| path.exists())
}

/// Load the configuration.
///
/// An explicit path must exist. Without one the default locations are
/// tried, falling back to built-in defaults.
pub(crate) fn load_config(explicit: Option<&Path>) -> anyhow::Result<Config> {
    match explicit {
        Some(path) => ConfigLoader::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => match default_config_path() {
            Some(path) => ConfigLoader::load_or_default(&path)
                .with_context(|| format!("Failed to load config from {}", path.display())),
            None => Ok(Config::default()),
        },
    }
}

/// Initialize tracing with console and optional rolling file output.
///
/// `RUST_LOG` takes precedence over the configured level.
pub(crate) fn init_tracing(logging: &LoggingConfig) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = match logging.resolved_directory() {
        Some(log_dir) => {
            std::fs::create_dir_all(&log_dir)
                .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

            let file_appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix("modpoll")
                .filename_suffix("log")
                .max_log_files(30)
                .build(&log_dir)?;
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            // The guard flushes on drop; keep it for the life of the process.
            static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
                std::sync::OnceLock::new();
            let _ = GUARD.set(guard);

            Some(fmt::layer().with_writer(non_blocking).with_ansi(false))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true).with_ansi(true))
        .with(file_layer)
        .init();

    Ok(())
}

async fn build_stores(
    storage: &StorageConfig,
) -> anyhow::Result<(Arc<dyn JobStore>, Arc<dyn ExecutionStore>)> {
    if storage.backend == "memory" {
        warn!("Using in-memory storage, jobs and executions are lost on exit");
        return Ok((
            Arc::new(MemoryJobStore::new()),
            Arc::new(MemoryExecutionStore::new()),
        ));
    }

    let path = storage.resolved_path();
    info!("Storing jobs and executions under {}", path.display());
    let jobs = FileJobStore::new(&path)
        .await
        .context("Failed to open job store")?;
    let executions = FileExecutionStore::new(&path)
        .await
        .context("Failed to open execution store")?;
    Ok((Arc::new(jobs), Arc::new(executions)))
}

/// Wire the scheduler from configuration.
pub(crate) async fn build_scheduler(config: &Config) -> anyhow::Result<Arc<JobScheduler>> {
    let (jobs, executions) = build_stores(&config.storage).await?;

    let client = TcpDeviceClient::new(ClientConfig {
        port: config.device.port,
        connect_timeout: config.device.connect_timeout(),
        read_timeout: config.device.read_timeout(),
    });
    let trigger = CronTaskScheduler::new(config.scheduler.pool_size);
    info!(
        "Device port {}, tick pool of {} worker(s)",
        config.device.port,
        trigger.pool_size()
    );

    Ok(Arc::new(JobScheduler::new(
        jobs,
        executions,
        Arc::new(client),
        Arc::new(trigger),
        Arc::new(TaskRegistry::new()),
    )))
}

/// Validate the configuration, logging every warning.
pub(crate) fn validate_config(config: &Config) -> anyhow::Result<()> {
    let warnings = ConfigValidator::validate(config)
        .into_result()
        .context("Invalid configuration")?;
    for warning in warnings {
        warn!("Config {}: {}", warning.path, warning.message);
    }
    Ok(())
}

/// Run the poller and its HTTP API until Ctrl-C.
pub(crate) async fn run_server(config: Config) -> anyhow::Result<()> {
    info!("Starting modpoll v{}", env!("CARGO_PKG_VERSION"));
    validate_config(&config)?;

    let scheduler = build_scheduler(&config).await?;
    if config.scheduler.resume_on_start {
        if let Err(e) = scheduler.resume().await {
            error!("Failed to resume jobs: {}", e);
        }
    }

    let state = Arc::new(AppState::new(scheduler.clone()));
    let server = ApiServer::new(
        ApiConfig::new(config.server.host.clone(), config.server.port),
        state,
    );
    let result = server.run(shutdown_signal()).await;

    scheduler.shutdown();
    result.with_context(|| format!("API server on {} failed", server.addr()))
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
