//! HTTP route handlers.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use modpoll_core::{Job, JobDetails, JobId, PageRequest};
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Body of a create or update request.
///
/// Both fields are required on create; on update an absent or empty field
/// keeps its current value.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRequest {
    pub target_ip: Option<String>,
    pub cron_expression: Option<String>,
}

/// Execution paging parameters.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
}

impl From<PageQuery> for PageRequest {
    fn from(query: PageQuery) -> Self {
        PageRequest::new(
            query.page.unwrap_or(0),
            query.size.unwrap_or(PageRequest::DEFAULT_SIZE as i64),
        )
    }
}

/// Liveness response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub active_tasks: usize,
    pub uptime_secs: u64,
}

/// Create the router.
pub fn create_router(state: Arc<AppState>) -> Router {
    let job_routes = Router::new()
        .route("/", get(list_jobs).post(create_job))
        .route("/{id}", get(get_job).delete(stop_job).patch(update_job));

    Router::new()
        .nest("/api/jobs", job_routes)
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Create a job and start polling.
///
/// POST /api/jobs
pub async fn create_job(
    State(state): State<Arc<AppState>>,
    Json(request): Json<JobRequest>,
) -> ApiResult<Json<Job>> {
    let target_ip = required(request.target_ip, "targetIp")?;
    let cron_expression = required(request.cron_expression, "cronExpression")?;

    info!("Creating job for {} (schedule: {})", target_ip, cron_expression);
    let job = state.scheduler.create(target_ip, cron_expression).await?;
    Ok(Json(job))
}

/// List all jobs.
///
/// GET /api/jobs
pub async fn list_jobs(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Job>>> {
    Ok(Json(state.scheduler.list().await?))
}

/// Job details with one page of executions.
///
/// GET /api/jobs/{id}?page=&size=
pub async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<JobDetails>> {
    let details = state
        .scheduler
        .details(&JobId::from(id), PageRequest::from(query))
        .await?;
    Ok(Json(details))
}

/// Stop a job.
///
/// DELETE /api/jobs/{id}
pub async fn stop_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    info!("Stopping job {}", id);
    state.scheduler.stop(&JobId::from(id)).await?;
    Ok(StatusCode::OK)
}

/// Update a job's target or schedule, or restart a stopped job.
///
/// PATCH /api/jobs/{id}
pub async fn update_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<JobRequest>,
) -> ApiResult<Json<Job>> {
    info!("Updating job {}", id);
    let job = state
        .scheduler
        .update(&JobId::from(id), request.target_ip, request.cron_expression)
        .await?;
    Ok(Json(job))
}

/// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        active_tasks: state.active_tasks(),
        uptime_secs: state.uptime().as_secs(),
    })
}

fn required(value: Option<String>, field: &str) -> ApiResult<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest(format!("Missing required field: {}", field)))
}

#[cfg(test)]
#[path = "routes_tests.rs"]
mod tests;
