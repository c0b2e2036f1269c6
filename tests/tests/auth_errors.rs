//! Tests for authentication and request errors.
//!
//! These tests verify that the API returns correct error codes for various
//! failure scenarios.

use api::RateLimitConfig;
use axum::http::StatusCode;
use dashboard_core::CatalogRow;
use integration_tests::{
    fixtures,
    mocks::{MockAnalytics, MockCatalog},
    setup::{bearer, login, TestContext},
};

#[tokio::test]
async fn test_login_returns_session() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let response = server
        .post("/login")
        .json(&fixtures::login_body(fixtures::NEWSROOM_USER, fixtures::NEWSROOM_PASSWORD))
        .await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert_eq!(body["publisher"], "example");
    assert_eq!(body["view"], "newsroom");
    assert_eq!(body["expiresIn"], 8 * 3600);
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
}

#[tokio::test]
async fn test_bad_credentials_return_auth_002() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let response = server
        .post("/login")
        .json(&fixtures::login_body(fixtures::CLIENT_USER, "wrong"))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "AUTH_002");
}

#[tokio::test]
async fn test_missing_token_returns_auth_001() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let response = server.get("/publishers/example/dashboard").await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "AUTH_001", "Expected AUTH_001 for missing token");
}

#[tokio::test]
async fn test_invalid_tokens_return_auth_003() {
    let ctx = TestContext::new();
    let server = ctx.server();

    for token in ["not-a-uuid", "6f1c2a9e-3b7d-4d8e-9a51-0c2f4e6b8d10"] {
        let response = server
            .get("/publishers/example/dashboard")
            .add_header("Authorization", bearer(token))
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = response.json();
        assert_eq!(body["code"], "AUTH_003", "token {token:?}");
    }
}

#[tokio::test]
async fn test_other_publisher_session_returns_auth_004() {
    let ctx = TestContext::new();
    let server = ctx.server();
    let token = login(&server, fixtures::OTHER_CLIENT_USER, fixtures::OTHER_CLIENT_PASSWORD).await;

    let response = server
        .get("/publishers/example/dashboard")
        .add_header("Authorization", bearer(&token))
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "AUTH_004");

    // The same session works for its own publisher.
    server
        .get("/publishers/other/growth")
        .add_header("Authorization", bearer(&token))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_unknown_publisher_returns_404() {
    let ctx = TestContext::new();
    let server = ctx.server();
    let token = login(&server, fixtures::CLIENT_USER, fixtures::CLIENT_PASSWORD).await;

    let response = server
        .get("/publishers/nope/dashboard")
        .add_header("Authorization", bearer(&token))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_invalid_parameters_return_400() {
    let ctx = TestContext::new();
    let server = ctx.server();
    let token = login(&server, fixtures::CLIENT_USER, fixtures::CLIENT_PASSWORD).await;

    let cases: [(&str, &[(&str, &str)], &str); 5] = [
        ("/publishers/example/dashboard", &[("start", "soon")], "VALID_002"),
        (
            "/publishers/example/dashboard",
            &[("start", "today"), ("end", "7daysAgo")],
            "VALID_002",
        ),
        ("/publishers/example/dashboard", &[("top", "0")], "VALID_001"),
        ("/publishers/example/growth", &[("period", "fortnight")], "VALID_001"),
        ("/publishers/example/growth", &[("period", "custom")], "VALID_001"),
    ];

    for (path, params, code) in cases {
        let mut request = server.get(path).add_header("Authorization", bearer(&token));
        for (key, value) in params {
            request = request.add_query_param(key, value);
        }
        let response = request.await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(body["code"], code, "{path} {params:?}");
    }
}

#[tokio::test]
async fn test_catalog_without_url_column_returns_422() {
    let broken = CatalogRow {
        url: None,
        title: Some("No url".into()),
        ..Default::default()
    };
    let ctx = TestContext::with_data(
        MockCatalog::new(vec![broken]),
        MockAnalytics::new(fixtures::scenario_analytics()),
    );
    let server = ctx.server();
    let token = login(&server, fixtures::CLIENT_USER, fixtures::CLIENT_PASSWORD).await;

    let response = server
        .get("/publishers/example/dashboard")
        .add_header("Authorization", bearer(&token))
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "DATA_001");
}

#[tokio::test]
async fn test_login_rate_limited() {
    let ctx = TestContext::with_login_limit(RateLimitConfig {
        per_minute: 2,
        burst: 2,
    });
    let server = ctx.server();

    for _ in 0..2 {
        server
            .post("/login")
            .add_header("X-Forwarded-For", "203.0.113.9")
            .json(&fixtures::login_body(fixtures::CLIENT_USER, "wrong"))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    let response = server
        .post("/login")
        .add_header("X-Forwarded-For", "203.0.113.9")
        .json(&fixtures::login_body(fixtures::CLIENT_USER, fixtures::CLIENT_PASSWORD))
        .await;

    response.assert_status(StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.header("Retry-After"), "30");
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "RATE_001");

    // A different client is unaffected.
    server
        .post("/login")
        .add_header("X-Forwarded-For", "198.51.100.7")
        .json(&fixtures::login_body(fixtures::CLIENT_USER, fixtures::CLIENT_PASSWORD))
        .await
        .assert_status_ok();
}
