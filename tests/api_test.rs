//! HTTP surface tests, driven in-process through the router

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use larpscore::api::{create_router, AppState};
use larpscore::{AdapterRegistry, Aggregator, CacheTtl, ReportCache, ScanManager, ScanTelemetry, ScoringEngine};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

fn setup() -> (Router, Arc<ScanManager>) {
    let manager = Arc::new(ScanManager::new(
        AdapterRegistry::new(),
        Aggregator::new(Duration::from_millis(100)),
        ScoringEngine::default(),
        ReportCache::in_memory(CacheTtl::uniform(Duration::from_secs(60))),
        Arc::new(ScanTelemetry::new()),
    ));
    let router = create_router(Arc::new(AppState::new(Arc::clone(&manager))));
    (router, manager)
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_scan(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/v1/scan")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health() {
    let (router, _) = setup();
    let (status, body) = send(&router, get("/v1/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "healthy");
    assert_eq!(body["data"]["service"], "LarpScore");
    assert_eq!(body["data"]["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_scan_lifecycle() {
    let (router, manager) = setup();

    let (status, body) = send(&router, post_scan(json!({ "query": "$PEPE" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["canonical_id"], "ticker:PEPE");
    assert_eq!(body["data"]["cached"], false);
    let job_id = body["data"]["job_id"].as_str().unwrap().to_string();

    manager.wait(&job_id).await.unwrap();

    let (status, body) = send(&router, get(&format!("/v1/scan/{}", job_id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "complete");
    assert_eq!(body["data"]["progress_percent"], 100);
    assert_eq!(body["data"]["result"]["score"], 0);
    assert_eq!(body["data"]["result"]["confidence"], "low");
    assert_eq!(body["data"]["result"]["risk_level"], "low");

    let (status, body) = send(&router, get("/v1/report/ticker:PEPE")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["fresh"], true);

    // Second submit is served from the cache
    let (_, body) = send(&router, post_scan(json!({ "query": "#pepe" }))).await;
    assert_eq!(body["data"]["cached"], true);

    // ...unless the caller forces a fresh scan
    let (_, body) = send(
        &router,
        post_scan(json!({ "query": "$PEPE", "force_fresh": true })),
    )
    .await;
    assert_eq!(body["data"]["cached"], false);
}

#[tokio::test]
async fn test_unclassifiable_query_is_422() {
    let (router, manager) = setup();
    let (status, body) = send(&router, post_scan(json!({ "query": "???" }))).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "RESOLVE_NO_MATCH");
    assert_eq!(manager.job_count(), 0);
}

#[tokio::test]
async fn test_empty_query_is_400() {
    let (router, _) = setup();
    let (status, body) = send(&router, post_scan(json!({ "query": "  " }))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "API_BAD_REQUEST");
}

#[tokio::test]
async fn test_unknown_job_and_report_are_404() {
    let (router, _) = setup();

    let (status, body) = send(&router, get("/v1/scan/does-not-exist")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "JOB_NOT_FOUND");

    let (status, _) = send(&router, get("/v1/report/domain:nothing.example")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_resolve_preview_creates_no_job() {
    let (router, manager) = setup();
    let (status, body) = send(&router, get("/v1/resolve?q=vitalik.eth")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["normalized_value"], "vitalik.eth");
    assert_eq!(manager.job_count(), 0);
}

#[tokio::test]
async fn test_invalid_api_key_is_rejected() {
    let (router, _) = setup();
    let request = Request::builder()
        .uri("/v1/stats")
        .header("x-api-key", "hunter2")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&router, request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "API_UNAUTHORIZED");
}

#[tokio::test]
async fn test_stats_report_rate_limit_headers() {
    let (router, _) = setup();
    let request = Request::builder()
        .uri("/v1/stats")
        .header("x-api-key", "pk_stats_test")
        .body(Body::empty())
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-ratelimit-remaining"));
    assert!(response.headers().contains_key("x-ratelimit-limit"));
}
