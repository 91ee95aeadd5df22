//! Integration tests for service routes and cross-cutting middleware.

mod common;

use axum::http::StatusCode;
use common::{get, get_with_headers, test_app};
use domain::services::StaticAnalyticsSource;

#[tokio::test]
async fn test_health_check_healthy() {
    let response = get(test_app(StaticAnalyticsSource::new()), "/api/health").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "healthy");
    assert_eq!(response.body["data_source"]["connected"], true);
    assert_eq!(response.body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_health_check_unhealthy() {
    let response = get(test_app(StaticAnalyticsSource::failing()), "/api/health").await;

    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.body["status"], "unhealthy");
    assert!(response.body["data_source"]["latency_ms"].is_null());
}

#[tokio::test]
async fn test_liveness_ignores_source() {
    let response = get(test_app(StaticAnalyticsSource::failing()), "/api/health/live").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "alive");
}

#[tokio::test]
async fn test_readiness() {
    let ready = get(test_app(StaticAnalyticsSource::new()), "/api/health/ready").await;
    assert_eq!(ready.status, StatusCode::OK);
    assert_eq!(ready.body["status"], "ready");

    let not_ready = get(test_app(StaticAnalyticsSource::failing()), "/api/health/ready").await;
    assert_eq!(not_ready.status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let response = get_with_headers(
        test_app(StaticAnalyticsSource::new()),
        "/api/health/live",
        &[("x-request-id", "dashboard-42")],
    )
    .await;

    assert_eq!(
        response.headers.get("x-request-id").unwrap(),
        "dashboard-42"
    );
}

#[tokio::test]
async fn test_request_id_is_generated() {
    let response = get(test_app(StaticAnalyticsSource::new()), "/api/health/live").await;

    let id = response.headers.get("x-request-id").unwrap().to_str().unwrap();
    assert!(uuid::Uuid::parse_str(id).is_ok());
}

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let response = get_with_headers(
        test_app(StaticAnalyticsSource::new()),
        "/api/v1/analytics/repeat-customers",
        &[("origin", "https://dashboard.example.com")],
    )
    .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.headers.get("access-control-allow-origin").unwrap(),
        "*"
    );
}
