use super::*;
use async_trait::async_trait;
use axum::body::{Body, to_bytes};
use axum::http::{Request, Response};
use modpoll_core::{
    CronTaskScheduler, JobScheduler, MemoryExecutionStore, MemoryJobStore, TaskRegistry,
};
use modpoll_wire::{RegisterReader, WireResult};
use serde_json::{Value, json};
use tower::ServiceExt;

const DORMANT: &str = "0 0 0 1 1 * 2099";

struct FixedReader;

#[async_trait]
impl RegisterReader for FixedReader {
    async fn read_register(&self, _address: &str, _register: u16) -> WireResult<f64> {
        Ok(50.0)
    }
}

fn create_test_router() -> Router {
    let scheduler = JobScheduler::new(
        Arc::new(MemoryJobStore::new()),
        Arc::new(MemoryExecutionStore::new()),
        Arc::new(FixedReader),
        Arc::new(CronTaskScheduler::new(2)),
        Arc::new(TaskRegistry::new()),
    );
    create_router(Arc::new(AppState::new(Arc::new(scheduler))))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> Response<Body> {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(request).await.unwrap()
}

async fn json_body(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn create(app: &Router, cron: &str) -> Value {
    let response = send(
        app,
        "POST",
        "/api/jobs",
        Some(json!({"targetIp": "10.0.0.5", "cronExpression": cron})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    json_body(response).await
}

#[tokio::test]
async fn test_create_job() {
    let app = create_test_router();
    let job = create(&app, DORMANT).await;

    assert_eq!(job["targetIp"], "10.0.0.5");
    assert_eq!(job["cronExpression"], DORMANT);
    assert_eq!(job["status"], "RUNNING");
    assert!(job["id"].is_string());
    assert!(job["createdAt"].is_string());
}

#[tokio::test]
async fn test_create_job_missing_field() {
    let app = create_test_router();
    let response = send(&app, "POST", "/api/jobs", Some(json!({"targetIp": "10.0.0.5"}))).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("cronExpression"));
}

#[tokio::test]
async fn test_list_jobs() {
    let app = create_test_router();
    create(&app, DORMANT).await;
    create(&app, DORMANT).await;

    let response = send(&app, "GET", "/api/jobs", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_get_job_details() {
    let app = create_test_router();
    let job = create(&app, DORMANT).await;
    let id = job["id"].as_str().unwrap();

    let response = send(&app, "GET", &format!("/api/jobs/{id}?page=-3&size=500"), None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let details = json_body(response).await;
    assert_eq!(details["jobId"], id);
    assert_eq!(details["status"], "RUNNING");
    assert_eq!(details["targetIp"], "10.0.0.5");
    assert!(details["executions"].as_array().unwrap().is_empty());
    assert_eq!(details["pagination"]["currentPage"], 0);
    assert_eq!(details["pagination"]["pageSize"], 100);
    assert_eq!(details["pagination"]["totalElements"], 0);
    assert_eq!(details["pagination"]["first"], true);
}

#[tokio::test]
async fn test_get_unknown_job() {
    let app = create_test_router();
    let response = send(&app, "GET", "/api/jobs/missing", None).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Job not found: missing");
}

#[tokio::test]
async fn test_stop_job_twice() {
    let app = create_test_router();
    let job = create(&app, DORMANT).await;
    let uri = format!("/api/jobs/{}", job["id"].as_str().unwrap());

    let response = send(&app, "DELETE", &uri, None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, "DELETE", &uri, None).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let details = json_body(send(&app, "GET", &uri, None).await).await;
    assert_eq!(details["status"], "STOPPED");
}

#[tokio::test]
async fn test_update_job() {
    let app = create_test_router();
    let job = create(&app, DORMANT).await;
    let uri = format!("/api/jobs/{}", job["id"].as_str().unwrap());
    send(&app, "DELETE", &uri, None).await;

    let response = send(&app, "PATCH", &uri, Some(json!({"targetIp": "10.0.0.6"}))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let updated = json_body(response).await;
    assert_eq!(updated["targetIp"], "10.0.0.6");
    assert_eq!(updated["cronExpression"], DORMANT);
    assert_eq!(updated["status"], "RUNNING");
}

#[tokio::test]
async fn test_update_unknown_job() {
    let app = create_test_router();
    let response = send(&app, "PATCH", "/api/jobs/missing", Some(json!({}))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_counts_active_tasks() {
    let app = create_test_router();
    create(&app, DORMANT).await;
    create(&app, "not a cron").await;

    let response = send(&app, "GET", "/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["active_tasks"], 1);
}

#[test]
fn test_page_query_defaults() {
    let request = PageRequest::from(PageQuery::default());
    assert_eq!(request.page(), 0);
    assert_eq!(request.size(), 20);
}
