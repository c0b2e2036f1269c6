//! Startup health checks for the upstreams.

use telemetry::health;
use tracing::{error, info};

use crate::catalog::CatalogSource;
use crate::token::TokenProvider;

/// Fetch the catalog once and record the outcome.
pub async fn check_catalog(catalog: &dyn CatalogSource) -> bool {
    match catalog.fetch_catalog().await {
        Ok(rows) => {
            health().catalog.set_healthy();
            info!(rows = rows.len(), "Catalog: healthy");
            true
        }
        Err(e) => {
            health().catalog.set_unhealthy(e.to_string());
            error!(error = %e, "Catalog: unhealthy");
            false
        }
    }
}

/// Obtain an access token for every configured account.
///
/// Healthy only when all accounts can authenticate.
pub async fn check_analytics(tokens: &TokenProvider) -> bool {
    let mut failures = Vec::new();
    let mut checked = 0usize;

    for account in tokens.account_names() {
        checked += 1;
        if let Err(e) = tokens.access_token(account).await {
            error!(account = %account, error = %e, "Analytics account cannot authenticate");
            failures.push(account.to_string());
        }
    }

    if checked == 0 {
        health().analytics.set_unhealthy("No analytics accounts configured");
        error!("Analytics: no accounts configured");
        false
    } else if failures.is_empty() {
        health().analytics.set_healthy();
        info!(accounts = checked, "Analytics: healthy");
        true
    } else {
        health()
            .analytics
            .set_unhealthy(format!("Authentication failed for: {}", failures.join(", ")));
        false
    }
}
