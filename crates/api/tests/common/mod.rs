//! Common test utilities for integration tests.
//!
//! The router is driven in-process against an in-memory aggregation
//! source, so no database is needed.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{HeaderMap, Request, StatusCode},
    Router,
};
use chrono::{DateTime, TimeZone, Utc};
use domain::models::DateRange;
use domain::services::StaticAnalyticsSource;
use storefront_analytics_api::{app::create_app, config::Config};
use tower::ServiceExt;

/// Test configuration with a placeholder database URL.
pub fn test_config() -> Config {
    Config::load_for_test(&[("database.url", "postgres://unused@localhost/unused")])
        .expect("Failed to build test config")
}

/// Router over `source` with the default test configuration.
pub fn test_app(source: StaticAnalyticsSource) -> Router {
    create_app(test_config(), Arc::new(source))
}

/// Router over `source` with configuration overrides.
pub fn test_app_with(source: StaticAnalyticsSource, overrides: &[(&str, &str)]) -> Router {
    let mut all = vec![("database.url", "postgres://unused@localhost/unused")];
    all.extend_from_slice(overrides);
    let config = Config::load_for_test(&all).expect("Failed to build test config");
    create_app(config, Arc::new(source))
}

/// Response status, headers and JSON body (`Null` when the body is empty or
/// not JSON).
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: serde_json::Value,
}

/// Issue a GET request against `app`.
pub async fn get(app: Router, uri: &str) -> TestResponse {
    get_with_headers(app, uri, &[]).await
}

pub async fn get_with_headers(app: Router, uri: &str, headers: &[(&str, &str)]) -> TestResponse {
    let mut request = Request::builder().method("GET").uri(uri);
    for (name, value) in headers {
        request = request.header(*name, *value);
    }

    let response = app
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);

    TestResponse {
        status,
        headers,
        body,
    }
}

pub fn utc(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap()
}

pub fn range(min: DateTime<Utc>, max: DateTime<Utc>) -> DateRange {
    DateRange { min, max }
}
