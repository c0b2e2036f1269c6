//! Tests for health check and metrics endpoints.
//!
//! These tests verify the endpoints return correct status and structure.

use axum::http::StatusCode;
use integration_tests::{
    fixtures,
    setup::{bearer, login, TestContext},
};

/// Test /health endpoint returns proper structure
#[tokio::test]
async fn test_health_endpoint_structure() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let response = server.get("/health").await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();

    for field in ["status", "catalog_reachable", "analytics_reachable", "components"] {
        assert!(body.get(field).is_some(), "Response should have '{field}' field");
    }

    let names: Vec<&str> = body["components"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|c| c["name"].as_str())
        .collect();
    assert_eq!(names, vec!["catalog", "analytics"]);

    let status = body["status"].as_str().unwrap_or("");
    assert!(
        status == "healthy" || status == "degraded" || status == "unhealthy",
        "Status should be 'healthy', 'degraded', or 'unhealthy', got '{}'",
        status
    );
}

/// Serving a dashboard marks both upstreams healthy.
#[tokio::test]
async fn test_health_follows_successful_fetches() {
    let ctx = TestContext::new();
    let server = ctx.server();
    let token = login(&server, fixtures::CLIENT_USER, fixtures::CLIENT_PASSWORD).await;

    server
        .get("/publishers/example/dashboard")
        .add_header("Authorization", bearer(&token))
        .await
        .assert_status_ok();

    let body: serde_json::Value = server.get("/health").await.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["catalog_reachable"], true);
    assert_eq!(body["analytics_reachable"], true);

    server.get("/health/ready").await.assert_status_ok();
}

/// Test /health/live endpoint always returns 200 when service is running
#[tokio::test]
async fn test_live_endpoint() {
    let ctx = TestContext::new();
    let server = ctx.server();

    server.get("/health/live").await.assert_status_ok();
}

/// Test that health endpoints don't require authentication
#[tokio::test]
async fn test_health_endpoints_no_auth_required() {
    let ctx = TestContext::new();
    let server = ctx.server();

    for path in ["/health", "/health/ready", "/health/live", "/metrics"] {
        let response = server.get(path).await;
        assert_ne!(
            response.status_code(),
            StatusCode::UNAUTHORIZED,
            "{path} should not require auth"
        );
    }
}

/// Test /metrics reports counters as numbers
#[tokio::test]
async fn test_metrics_snapshot() {
    let ctx = TestContext::new();
    let server = ctx.server();
    login(&server, fixtures::CLIENT_USER, fixtures::CLIENT_PASSWORD).await;

    let response = server.get("/metrics").await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert!(body["loginsSucceeded"].as_u64().is_some_and(|n| n >= 1));
    assert!(body["activeSessions"].as_u64().is_some());
    assert!(body["matchRate"].as_f64().is_some());
    assert!(body["timestamp"].is_string());
}
