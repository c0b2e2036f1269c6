//! Application state shared across handlers.

use crate::middleware::rate_limit::{RateLimitConfig, RateLimiter, SharedRateLimiter};
use chrono::{Local, NaiveDate};
use dashboard_core::limits::{SESSION_MAX_CAPACITY, SESSION_TTL_SECS};
use dashboard_core::{PublisherRegistry, Session, SessionToken};
use moka::future::Cache;
use sources::{AnalyticsSource, CatalogSource};
use std::sync::Arc;
use std::time::Duration;
use telemetry::metrics;
use tracing::debug;

/// Idle buckets older than this are dropped by the cleanup task.
const RATE_LIMIT_BUCKET_MAX_AGE: Duration = Duration::from_secs(600);

/// Logged-in sessions, expiring after a fixed TTL.
#[derive(Clone)]
pub struct SessionStore {
    cache: Cache<SessionToken, Session>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration, max_capacity: u64) -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .eviction_listener(|_token, _session, _cause| metrics().active_sessions.dec())
                .build(),
            ttl,
        }
    }

    /// Store a freshly created session.
    pub async fn insert(&self, session: Session) {
        debug!(publisher = %session.publisher, view = %session.view, "Session created");
        self.cache.insert(session.token, session).await;
        metrics().active_sessions.inc();
    }

    /// Look up a live session.
    pub async fn get(&self, token: &SessionToken) -> Option<Session> {
        self.cache.get(token).await
    }

    /// End a session. Returns whether it existed.
    pub async fn revoke(&self, token: &SessionToken) -> bool {
        self.cache.remove(token).await.is_some()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(Duration::from_secs(SESSION_TTL_SECS), SESSION_MAX_CAPACITY)
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Configured publishers
    pub publishers: Arc<PublisherRegistry>,
    /// Article catalog (spreadsheet in production, mock in tests)
    pub catalog: Arc<dyn CatalogSource>,
    /// Analytics reports (GA4 in production, mock in tests)
    pub analytics: Arc<dyn AnalyticsSource>,
    pub sessions: SessionStore,
    /// Per-client login limiter
    pub login_limiter: SharedRateLimiter,
    /// Fixed "today", for reproducible date arithmetic in tests.
    today: Option<NaiveDate>,
}

impl AppState {
    pub fn new(
        publishers: PublisherRegistry,
        catalog: Arc<dyn CatalogSource>,
        analytics: Arc<dyn AnalyticsSource>,
    ) -> Self {
        Self {
            publishers: Arc::new(publishers),
            catalog,
            analytics,
            sessions: SessionStore::default(),
            login_limiter: Arc::new(RateLimiter::new(RateLimitConfig::default())),
            today: None,
        }
    }

    /// Replace the session store, e.g. to change the TTL.
    pub fn with_sessions(mut self, sessions: SessionStore) -> Self {
        self.sessions = sessions;
        self
    }

    /// Create with custom login rate limit config.
    pub fn with_login_limit(mut self, config: RateLimitConfig) -> Self {
        self.login_limiter = Arc::new(RateLimiter::new(config));
        self
    }

    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    /// The current local date, unless pinned with [`AppState::with_today`].
    pub fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    /// Start the rate limiter cleanup background task.
    /// Returns a handle that can be used to cancel the task.
    pub fn start_rate_limiter_cleanup(&self) -> tokio::task::JoinHandle<()> {
        let rate_limiter = self.login_limiter.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(300));
            loop {
                interval.tick().await;
                rate_limiter.cleanup(RATE_LIMIT_BUCKET_MAX_AGE);
            }
        })
    }
}
