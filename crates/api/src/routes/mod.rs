//! API routes.

pub mod auth;
pub mod dashboard;
pub mod growth;
pub mod health;

use axum::{
    routing::{get, post},
    Router,
};
use dashboard_core::{PublisherConfig, Session};
use serde::{Deserialize, Serialize};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::response::ApiError;
use crate::state::AppState;

/// Creates the API router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/login", post(auth::login_handler))
        .route("/logout", post(auth::logout_handler))
        .route("/publishers/:slug/dashboard", get(dashboard::dashboard_handler))
        .route("/publishers/:slug/growth", get(growth::growth_handler))
        .route("/health", get(health::health_handler))
        .route("/health/ready", get(health::ready_handler))
        .route("/health/live", get(health::live_handler))
        .route("/metrics", get(health::metrics_handler))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Public description of a publisher, as shown in dashboard headers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublisherInfo {
    pub slug: String,
    pub name: String,
    pub domain: String,
    pub color: String,
    pub monthly_goal: u64,
}

impl From<&PublisherConfig> for PublisherInfo {
    fn from(p: &PublisherConfig) -> Self {
        Self {
            slug: p.slug.clone(),
            name: p.name.clone(),
            domain: p.domain.clone(),
            color: p.color.clone(),
            monthly_goal: p.monthly_goal,
        }
    }
}

/// Resolve `slug` and check the session may read it.
///
/// Unknown publishers are `404 NOT_FOUND`; another publisher's session is
/// `403 AUTH_004`.
fn authorized_publisher<'a>(
    state: &'a AppState,
    session: &Session,
    slug: &str,
) -> Result<&'a PublisherConfig, ApiError> {
    let publisher = state.publishers.get(slug)?;
    session.authorize(&publisher.slug)?;
    Ok(publisher)
}

/// Splits a comma-separated query value, dropping blanks.
fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}
