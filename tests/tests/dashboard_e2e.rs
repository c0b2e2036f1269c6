//! End-to-end tests for the dashboard and growth endpoints.
//!
//! Runs the real router against mock sources with "today" pinned to
//! 2024-03-15.

use axum_test::TestServer;
use dashboard_core::{AnalyticsRow, DateRange};
use integration_tests::{
    fixtures,
    mocks::{MockAnalytics, MockCatalog},
    setup::{bearer, login, TestContext},
};

async fn newsroom(ctx: &TestContext) -> (TestServer, String) {
    let server = ctx.server();
    let token = login(&server, fixtures::NEWSROOM_USER, fixtures::NEWSROOM_PASSWORD).await;
    (server, token)
}

/// The catalog is left-joined with analytics: `/a` and `/a/amp` merge into
/// one article, `/b` is zero-filled and `/c` is dropped.
#[tokio::test]
async fn test_dashboard_reconciles_scenario() {
    let ctx = TestContext::new();
    let (server, token) = newsroom(&ctx).await;

    let response = server
        .get("/publishers/example/dashboard")
        .add_header("Authorization", bearer(&token))
        .await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();

    let articles = body["articles"].as_array().expect("articles array");
    assert_eq!(articles.len(), 2, "one row per catalog article of the domain");

    assert_eq!(articles[0]["url"], "https://example.com/a/");
    assert_eq!(articles[0]["pageViews"], 15);
    assert_eq!(articles[0]["sessions"], 12);
    assert_eq!(articles[0]["bounceRate"], 50.0);
    assert_eq!(articles[0]["matched"], true);

    assert_eq!(articles[1]["url"], "https://example.com/b");
    assert_eq!(articles[1]["pageViews"], 0);
    assert_eq!(articles[1]["bounceRate"], 0.0);
    assert_eq!(articles[1]["matched"], false);

    assert_eq!(body["kpis"]["pageViews"], 15.0);
    assert_eq!(body["siteKpis"]["pageViews"], 115.0);
    assert_eq!(body["domainComparison"]["domainPageViews"], 115);
    assert_eq!(body["domainComparison"]["catalogPageViews"], 15);

    assert_eq!(body["publisher"]["slug"], "example");
    assert_eq!(body["view"], "newsroom");
    assert_eq!(body["range"]["start"], "2024-02-14");
    assert_eq!(body["range"]["end"], "2024-03-15");
    assert!(body["warnings"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_dashboard_sections() {
    let ctx = TestContext::new();
    let (server, token) = newsroom(&ctx).await;

    let body: serde_json::Value = server
        .get("/publishers/example/dashboard")
        .add_header("Authorization", bearer(&token))
        .await
        .json();

    let top = body["topPages"].as_array().unwrap();
    assert_eq!(top[0]["url"], "https://example.com/a/");

    let authors = body["authors"].as_array().expect("newsroom sees authors");
    assert_eq!(authors.len(), 2);
    assert_eq!(authors[0]["author"], "Ana");
    assert_eq!(authors[0]["pageViews"], 15);

    let progress = &body["monthlyProgress"];
    assert_eq!(progress["goal"], 3_000_000);
    assert_eq!(progress["pageViews"], 15);
    assert_eq!(progress["daysElapsed"], 15);
    assert_eq!(progress["daysInMonth"], 31);

    let daily = progress["daily"].as_array().expect("daily series");
    assert_eq!(daily.len(), 15);
    assert_eq!(daily[0]["date"], "2024-03-01");
    assert_eq!(daily[0]["goalLine"], 3_000_000.0 / 31.0);
    // `/c` is not a catalog article and stays out of the series.
    assert_eq!(daily[13]["pageViews"], 10);
    assert_eq!(daily[14]["pageViews"], 5);
    assert_eq!(daily[14]["cumulative"], 15);
    assert_eq!(daily[14]["goalLine"], 3_000_000.0 / 31.0 * 15.0);

    assert_eq!(
        body["filters"]["sources"],
        serde_json::json!(["facebook", "google"])
    );
    assert_eq!(
        body["filters"]["mediums"],
        serde_json::json!(["organic", "social"])
    );
    assert_eq!(body["filters"]["authors"], serde_json::json!(["Ana", "Beto"]));

    // The month-to-date fetch covers the 1st through today.
    let march = DateRange::new(fixtures::date(2024, 3, 1), fixtures::today()).unwrap();
    assert!(ctx.analytics.requests().iter().any(|r| r.range == march));
    assert!(ctx.analytics.requests().iter().all(|r| r.property_id == "1000"));
}

#[tokio::test]
async fn test_author_ranking_publication_range() {
    let ctx = TestContext::new();
    let (server, token) = newsroom(&ctx).await;

    let body: serde_json::Value = server
        .get("/publishers/example/dashboard")
        .add_header("Authorization", bearer(&token))
        .await
        .json();
    assert_eq!(body["authorsPublished"]["start"], "2024-03-01");
    assert_eq!(body["authorsPublished"]["end"], "2024-03-31");

    // Only Beto published on or after the 11th.
    let body: serde_json::Value = server
        .get("/publishers/example/dashboard")
        .add_query_param("authorStart", "2024-03-11")
        .add_header("Authorization", bearer(&token))
        .await
        .json();
    let authors = body["authors"].as_array().unwrap();
    assert_eq!(authors.len(), 1);
    assert_eq!(authors[0]["author"], "Beto");
    // The article table is not affected.
    assert_eq!(body["articles"].as_array().unwrap().len(), 2);

    let response = server
        .get("/publishers/example/dashboard")
        .add_query_param("authorStart", "2024-03-20")
        .add_query_param("authorEnd", "2024-03-01")
        .add_header("Authorization", bearer(&token))
        .await;
    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "VALID_002");
}

#[tokio::test]
async fn test_client_view_hides_authors() {
    let ctx = TestContext::new();
    let server = ctx.server();
    let token = login(&server, fixtures::CLIENT_USER, fixtures::CLIENT_PASSWORD).await;

    let body: serde_json::Value = server
        .get("/publishers/example/dashboard")
        .add_header("X-Session-Token", token)
        .await
        .json();

    assert_eq!(body["view"], "client");
    assert!(body.get("authors").is_none());
    assert!(body.get("authorsPublished").is_none());
    assert_eq!(body["kpis"]["pageViews"], 15.0);
}

#[tokio::test]
async fn test_dashboard_filters() {
    let ctx = TestContext::new();
    let (server, token) = newsroom(&ctx).await;

    let body: serde_json::Value = server
        .get("/publishers/example/dashboard")
        .add_query_param("source", "google")
        .add_header("Authorization", bearer(&token))
        .await
        .json();
    assert_eq!(body["articles"][0]["pageViews"], 10);
    assert_eq!(body["siteKpis"]["pageViews"], 110.0);
    // Pickers still offer every source in the report.
    assert_eq!(body["filters"]["sources"].as_array().unwrap().len(), 2);

    let body: serde_json::Value = server
        .get("/publishers/example/dashboard")
        .add_query_param("author", "Beto")
        .add_query_param("top", "1")
        .add_header("Authorization", bearer(&token))
        .await
        .json();
    let articles = body["articles"].as_array().unwrap();
    assert_eq!(articles.len(), 1);
    assert_eq!(articles[0]["author"], "Beto");
    assert_eq!(body["topPages"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_dashboard_explicit_range() {
    let ctx = TestContext::new();
    let (server, token) = newsroom(&ctx).await;

    let body: serde_json::Value = server
        .get("/publishers/example/dashboard")
        .add_query_param("start", "7daysAgo")
        .add_query_param("end", "yesterday")
        .add_header("Authorization", bearer(&token))
        .await
        .json();

    assert_eq!(body["range"]["start"], "2024-03-08");
    assert_eq!(body["range"]["end"], "2024-03-14");
}

#[tokio::test]
async fn test_empty_catalog_shows_site_kpis() {
    let ctx = TestContext::with_data(
        MockCatalog::new(Vec::new()),
        MockAnalytics::new(fixtures::scenario_analytics()),
    );
    let (server, token) = newsroom(&ctx).await;

    let response = server
        .get("/publishers/example/dashboard")
        .add_header("Authorization", bearer(&token))
        .await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert!(body["articles"].as_array().unwrap().is_empty());
    assert_eq!(body["kpis"]["pageViews"], 115.0);
    assert!(!body["warnings"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_growth_week_over_week() {
    let ctx = TestContext::new();
    let previous = DateRange::new(fixtures::date(2024, 3, 2), fixtures::date(2024, 3, 8)).unwrap();
    ctx.analytics
        .set_rows_for(previous, vec![AnalyticsRow::new("/a").with_page_views(5)]);
    let (server, token) = newsroom(&ctx).await;

    let response = server
        .get("/publishers/example/growth")
        .add_query_param("period", "week")
        .add_header("Authorization", bearer(&token))
        .await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert_eq!(body["period"], "week");
    assert_eq!(body["current"]["start"], "2024-03-09");
    assert_eq!(body["current"]["end"], "2024-03-15");
    assert_eq!(body["previous"]["start"], "2024-03-02");
    assert_eq!(body["previous"]["end"], "2024-03-08");

    let page_views = &body["metrics"]["pageViews"];
    assert_eq!(page_views["current"], 15.0);
    assert_eq!(page_views["previous"], 5.0);
    assert_eq!(page_views["growthPercentage"], 200.0);
    assert_eq!(body["labels"]["pageViews"], "+200.0% (+10)");

    // No sessions in the previous week: growth from zero.
    assert_eq!(body["metrics"]["sessions"]["growthPercentage"], "new");
    assert_eq!(body["labels"]["sessions"], "new (+12)");
}

#[tokio::test]
async fn test_growth_custom_period() {
    let ctx = TestContext::new();
    let (server, token) = newsroom(&ctx).await;

    let body: serde_json::Value = server
        .get("/publishers/example/growth")
        .add_query_param("period", "custom")
        .add_query_param("currentStart", "2024-03-10")
        .add_query_param("currentEnd", "2024-03-12")
        .add_query_param("previousStart", "2024-02-10")
        .add_query_param("previousEnd", "2024-02-12")
        .add_header("Authorization", bearer(&token))
        .await
        .json();

    assert_eq!(body["period"], "custom");
    assert_eq!(body["current"]["start"], "2024-03-10");
    assert_eq!(body["previous"]["end"], "2024-02-12");
    // Same report both times.
    assert_eq!(body["metrics"]["pageViews"]["growthPercentage"], 0.0);
    assert_eq!(body["labels"]["pageViews"], "0.0% (0)");
}

#[tokio::test]
async fn test_logout_ends_session() {
    let ctx = TestContext::new();
    let (server, token) = newsroom(&ctx).await;

    server
        .post("/logout")
        .add_header("Authorization", bearer(&token))
        .await
        .assert_status(axum::http::StatusCode::NO_CONTENT);

    let response = server
        .get("/publishers/example/dashboard")
        .add_header("Authorization", bearer(&token))
        .await;
    response.assert_status_unauthorized();
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "AUTH_003");
}
