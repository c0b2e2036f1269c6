//! Publisher Dashboards
//!
//! Per-publisher article analytics served over HTTP:
//! - Article catalog from a published spreadsheet
//! - GA4 traffic reports joined onto the catalog by normalized URL
//! - KPI, top-article, author, monthly-goal and growth views per publisher

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{info, warn};

use api::{router, AppState, RateLimitConfig, SessionStore};
use dashboard_core::limits::{LOGIN_ATTEMPTS_PER_MINUTE, SESSION_MAX_CAPACITY, SESSION_TTL_SECS};
use dashboard_core::{PublisherConfig, PublisherRegistry};
use sources::{
    AnalyticsSource, CachedAnalytics, CachedCatalog, CatalogSource, Ga4Client, SheetCatalog,
    SourcesConfig,
};
use telemetry::init_tracing_from_env;

/// Application configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct Config {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,

    /// How long a login stays valid
    #[serde(default = "default_session_ttl_secs")]
    session_ttl_secs: u64,

    /// Login attempts allowed per client per minute
    #[serde(default = "default_login_attempts_per_minute")]
    login_attempts_per_minute: u32,

    #[serde(default)]
    publishers: Vec<PublisherConfig>,

    #[serde(default)]
    sources: SourcesConfig,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_session_ttl_secs() -> u64 {
    SESSION_TTL_SECS
}

fn default_login_attempts_per_minute() -> u32 {
    LOGIN_ATTEMPTS_PER_MINUTE
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            session_ttl_secs: default_session_ttl_secs(),
            login_attempts_per_minute: default_login_attempts_per_minute(),
            publishers: Vec::new(),
            sources: SourcesConfig::default(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing_from_env();

    info!("Starting Publisher Dashboards v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config()?;

    let publishers = PublisherRegistry::new(config.publishers.clone())
        .context("Invalid publisher configuration")?;
    if publishers.is_empty() {
        warn!("No publishers configured; every login will fail");
    }
    for publisher in publishers.iter() {
        if !config.sources.analytics.accounts.contains_key(&publisher.account) {
            warn!(
                publisher = %publisher.slug,
                account = %publisher.account,
                "Publisher references an OAuth account that is not configured"
            );
        }
    }
    info!(publishers = publishers.len(), "Loaded publisher config");

    let sheet = SheetCatalog::new(config.sources.catalog.clone())
        .context("Failed to create catalog client")?;
    let catalog = Arc::new(CachedCatalog::new(Arc::new(sheet), &config.sources.cache));

    let ga4 = Arc::new(
        Ga4Client::new(config.sources.analytics.clone())
            .context("Failed to create analytics client")?,
    );
    let tokens = ga4.tokens().clone();
    let analytics = Arc::new(CachedAnalytics::new(ga4, &config.sources.cache));

    // Check health and update status
    check_health(catalog.as_ref(), &tokens).await;

    let catalog: Arc<dyn CatalogSource> = catalog;
    let analytics: Arc<dyn AnalyticsSource> = analytics;

    let state = AppState::new(publishers, catalog, analytics)
        .with_sessions(SessionStore::new(
            Duration::from_secs(config.session_ttl_secs),
            SESSION_MAX_CAPACITY,
        ))
        .with_login_limit(RateLimitConfig {
            per_minute: config.login_attempts_per_minute,
            burst: config.login_attempts_per_minute,
        });

    // Start rate limiter cleanup background task
    let _rate_limiter_cleanup = state.start_rate_limiter_cleanup();
    info!("Started rate limiter cleanup task (every 5 minutes)");

    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("Invalid server address")?;

    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutdown complete");
    Ok(())
}

/// Load configuration from files and environment.
fn load_config() -> Result<Config> {
    let config = config::Config::builder()
        // Start with defaults
        .add_source(config::Config::try_from(&Config::default())?)
        // Load from config file if exists
        .add_source(
            config::File::with_name("config/default")
                .required(false)
                .format(config::FileFormat::Toml),
        )
        // Override with environment variables, e.g. DASHBOARD__PORT or
        // DASHBOARD__SOURCES__CATALOG__SPREADSHEET_ID
        .add_source(
            config::Environment::with_prefix("DASHBOARD")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    let mut config: Config = config
        .try_deserialize()
        .context("Failed to deserialize configuration")?;

    // The config crate's nested parsing doesn't reach into the accounts map
    // reliably, so secrets can also be given per account:
    // DASHBOARD_OAUTH_<ACCOUNT>_REFRESH_TOKEN / _CLIENT_ID / _CLIENT_SECRET
    for (name, account) in config.sources.analytics.accounts.iter_mut() {
        let prefix = format!("DASHBOARD_OAUTH_{}", name.to_uppercase());
        if let Ok(client_id) = std::env::var(format!("{prefix}_CLIENT_ID")) {
            account.client_id = client_id;
        }
        if let Ok(client_secret) = std::env::var(format!("{prefix}_CLIENT_SECRET")) {
            account.client_secret = client_secret;
        }
        if let Ok(refresh_token) = std::env::var(format!("{prefix}_REFRESH_TOKEN")) {
            account.refresh_token = refresh_token;
        }
    }

    if let Ok(spreadsheet_id) = std::env::var("DASHBOARD_SPREADSHEET_ID") {
        config.sources.catalog.spreadsheet_id = spreadsheet_id;
    }

    Ok(config)
}

/// Check upstream health on startup.
async fn check_health(catalog: &dyn CatalogSource, tokens: &sources::TokenProvider) {
    let catalog_ok = sources::health::check_catalog(catalog).await;
    let analytics_ok = sources::health::check_analytics(tokens).await;

    if !catalog_ok && !analytics_ok {
        warn!("No upstream reachable; dashboards will be empty until one recovers");
    }
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            info!("Received terminate signal");
        }
    }
}
