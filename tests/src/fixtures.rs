//! Test fixtures: publishers, catalog and analytics rows.

use chrono::NaiveDate;
use dashboard_core::{AnalyticsRow, CatalogRow, Credential, PublisherConfig};

pub const NEWSROOM_USER: &str = "example_redaccion";
pub const NEWSROOM_PASSWORD: &str = "example_red123";
pub const CLIENT_USER: &str = "example_cliente";
pub const CLIENT_PASSWORD: &str = "example123";
pub const OTHER_CLIENT_USER: &str = "other_cliente";
pub const OTHER_CLIENT_PASSWORD: &str = "other123";

/// The pinned "today" every test runs on.
pub fn today() -> NaiveDate {
    date(2024, 3, 15)
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn publisher(slug: &str, domain: &str, property_id: &str) -> PublisherConfig {
    PublisherConfig {
        slug: slug.to_string(),
        name: slug.to_uppercase(),
        domain: domain.to_string(),
        property_id: property_id.to_string(),
        account: "test".to_string(),
        color: "#1e88e5".to_string(),
        monthly_goal: 3_000_000,
        newsroom: Credential::new(format!("{slug}_redaccion"), format!("{slug}_red123")),
        client: Credential::new(format!("{slug}_cliente"), format!("{slug}123")),
    }
}

/// Two publishers: `example` (example.com) and `other` (other.com).
pub fn publishers() -> Vec<PublisherConfig> {
    vec![
        publisher("example", "example.com", "1000"),
        publisher("other", "other.com", "2000"),
    ]
}

/// Catalog of the end-to-end scenario, plus an article of another site.
pub fn scenario_catalog() -> Vec<CatalogRow> {
    vec![
        CatalogRow::new("https://example.com/a/")
            .with_title("Article A")
            .with_author("Ana")
            .with_published_at(date(2024, 3, 10)),
        CatalogRow::new("https://example.com/b")
            .with_title("Article B")
            .with_author("Beto")
            .with_published_at(date(2024, 3, 12)),
        CatalogRow::new("https://other.com/z").with_title("Elsewhere"),
    ]
}

/// Analytics of the end-to-end scenario: `/a` and `/a/amp` merge, `/c`
/// has no catalog entry.
pub fn scenario_analytics() -> Vec<AnalyticsRow> {
    vec![
        AnalyticsRow::new("/a")
            .with_page_views(10)
            .with_sessions(8)
            .with_bounce_rate(40.0)
            .with_date(date(2024, 3, 14))
            .with_source("google", "organic"),
        AnalyticsRow::new("/a/amp")
            .with_page_views(5)
            .with_sessions(4)
            .with_bounce_rate(60.0)
            .with_date(date(2024, 3, 15))
            .with_source("facebook", "social"),
        AnalyticsRow::new("/c")
            .with_page_views(100)
            .with_sessions(90)
            .with_date(date(2024, 3, 14))
            .with_source("google", "organic"),
    ]
}

pub fn login_body(username: &str, password: &str) -> serde_json::Value {
    serde_json::json!({ "username": username, "password": password })
}
