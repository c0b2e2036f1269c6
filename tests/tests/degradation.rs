//! Upstream failures degrade dashboards instead of failing requests.
//!
//! Health is process-global, so every phase runs in one test to keep the
//! component assertions deterministic.

use integration_tests::{
    fixtures,
    setup::{bearer, login, TestContext},
};
use telemetry::{health, metrics};

#[tokio::test]
async fn test_upstream_failures_degrade_to_empty_tables() {
    let ctx = TestContext::new();
    let server = ctx.server();
    let token = login(&server, fixtures::NEWSROOM_USER, fixtures::NEWSROOM_PASSWORD).await;
    let degraded_before = metrics().degraded_responses.get();

    // Analytics down: no data to reconcile, but the catalog still feeds
    // the author picker.
    ctx.analytics.set_should_fail(true);

    let response = server
        .get("/publishers/example/dashboard")
        .add_header("Authorization", bearer(&token))
        .await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert!(body["articles"].as_array().unwrap().is_empty());
    assert!(body["topPages"].as_array().unwrap().is_empty());
    assert_eq!(body["kpis"]["pageViews"], 0.0);
    assert_eq!(body["siteKpis"]["pageViews"], 0.0);
    assert_eq!(body["monthlyProgress"]["pageViews"], 0);
    let daily = body["monthlyProgress"]["daily"].as_array().unwrap();
    assert_eq!(daily.len(), 15);
    assert!(daily.iter().all(|d| d["cumulative"] == 0));
    assert_eq!(body["filters"]["authors"], serde_json::json!(["Ana", "Beto"]));

    let warnings = body["warnings"].as_array().unwrap();
    assert!(warnings
        .iter()
        .any(|w| w.as_str().unwrap_or("").contains("Analytics unavailable")));

    assert!(!health().analytics.is_healthy());
    assert!(health().catalog.is_healthy());
    assert!(metrics().degraded_responses.get() > degraded_before);

    // Growth degrades the same way.
    let response = server
        .get("/publishers/example/growth")
        .add_query_param("period", "month")
        .add_header("Authorization", bearer(&token))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["metrics"]["pageViews"]["growthPercentage"], 0.0);
    assert!(!body["warnings"].as_array().unwrap().is_empty());

    // Catalog down as well: an empty dashboard, still 200.
    ctx.catalog.set_should_fail(true);

    let response = server
        .get("/publishers/example/dashboard")
        .add_header("Authorization", bearer(&token))
        .await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert!(body["articles"].as_array().unwrap().is_empty());
    assert!(body["filters"]["authors"].as_array().unwrap().is_empty());
    assert!(body["warnings"]
        .as_array()
        .unwrap()
        .iter()
        .any(|w| w.as_str().unwrap_or("").contains("Catalog unavailable")));
    assert!(!health().catalog.is_healthy());
    assert!(!health().is_ready());

    // Recovery flips both components back.
    ctx.analytics.set_should_fail(false);
    ctx.catalog.set_should_fail(false);

    let body: serde_json::Value = server
        .get("/publishers/example/dashboard")
        .add_header("Authorization", bearer(&token))
        .await
        .json();
    assert_eq!(body["articles"][0]["pageViews"], 15);
    assert!(health().analytics.is_healthy());
    assert!(health().catalog.is_healthy());
    assert!(health().is_ready());
}
