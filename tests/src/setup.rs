//! Common test setup functions.

use api::{router, AppState, RateLimitConfig};
use axum::Router;
use axum_test::TestServer;
use dashboard_core::PublisherRegistry;
use std::sync::Arc;

use crate::fixtures;
use crate::mocks::{MockAnalytics, MockCatalog};

/// Test context with mock sources behind the real router.
///
/// This exercises the production code paths by:
/// - Using the real Axum router with all layers
/// - Using mock sources implementing `CatalogSource` / `AnalyticsSource`
/// - Pinning "today" so date ranges are reproducible
pub struct TestContext {
    pub catalog: MockCatalog,
    pub analytics: MockAnalytics,
    pub state: AppState,
    pub router: Router,
}

impl TestContext {
    /// Context with the end-to-end scenario loaded.
    pub fn new() -> Self {
        Self::with_data(
            MockCatalog::new(fixtures::scenario_catalog()),
            MockAnalytics::new(fixtures::scenario_analytics()),
        )
    }

    pub fn with_data(catalog: MockCatalog, analytics: MockAnalytics) -> Self {
        Self::build(catalog, analytics, RateLimitConfig::default())
    }

    /// Context with a custom login rate limit.
    pub fn with_login_limit(config: RateLimitConfig) -> Self {
        Self::build(
            MockCatalog::new(fixtures::scenario_catalog()),
            MockAnalytics::new(fixtures::scenario_analytics()),
            config,
        )
    }

    fn build(catalog: MockCatalog, analytics: MockAnalytics, limit: RateLimitConfig) -> Self {
        let publishers =
            PublisherRegistry::new(fixtures::publishers()).expect("Invalid test publishers");

        let state = AppState::new(
            publishers,
            Arc::new(catalog.clone()),
            Arc::new(analytics.clone()),
        )
        .with_login_limit(limit)
        .with_today(fixtures::today());

        let router = router(state.clone());

        Self {
            catalog,
            analytics,
            state,
            router,
        }
    }

    pub fn server(&self) -> TestServer {
        TestServer::new(self.router.clone()).expect("Failed to create test server")
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Log in and return the session token.
pub async fn login(server: &TestServer, username: &str, password: &str) -> String {
    let response = server
        .post("/login")
        .json(&fixtures::login_body(username, password))
        .await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    body["token"]
        .as_str()
        .expect("login response has a token")
        .to_string()
}

/// `Authorization` header value for a token.
pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}
