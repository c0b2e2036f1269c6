//! TTL caches in front of the catalog and analytics sources.
//!
//! Successful fetches are kept for the configured TTL; failures are never
//! cached, so the next request retries the upstream.

use async_trait::async_trait;
use dashboard_core::{AnalyticsRow, CatalogRow, DateRange, Result};
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use telemetry::metrics;
use tracing::debug;

use crate::analytics::AnalyticsSource;
use crate::catalog::CatalogSource;
use crate::config::CacheConfig;

/// Cache key for an analytics report.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ReportKey {
    property_id: String,
    account: String,
    range: DateRange,
}

/// Caching wrapper for any [`CatalogSource`].
pub struct CachedCatalog {
    inner: Arc<dyn CatalogSource>,
    cache: Cache<(), Arc<Vec<CatalogRow>>>,
}

impl CachedCatalog {
    pub fn new(inner: Arc<dyn CatalogSource>, config: &CacheConfig) -> Self {
        Self {
            inner,
            cache: Cache::builder()
                .max_capacity(1)
                .time_to_live(Duration::from_secs(config.ttl_secs))
                .build(),
        }
    }

    /// Drop the cached catalog.
    pub async fn invalidate(&self) {
        self.cache.invalidate(&()).await;
    }
}

#[async_trait]
impl CatalogSource for CachedCatalog {
    async fn fetch_catalog(&self) -> Result<Vec<CatalogRow>> {
        if let Some(cached) = self.cache.get(&()).await {
            debug!(rows = cached.len(), "Catalog cache hit");
            metrics().catalog_cache_hits.inc();
            return Ok(cached.as_ref().clone());
        }

        let rows = self.inner.fetch_catalog().await?;
        self.cache.insert((), Arc::new(rows.clone())).await;
        Ok(rows)
    }
}

/// Caching wrapper for any [`AnalyticsSource`].
pub struct CachedAnalytics {
    inner: Arc<dyn AnalyticsSource>,
    cache: Cache<ReportKey, Arc<Vec<AnalyticsRow>>>,
}

impl CachedAnalytics {
    pub fn new(inner: Arc<dyn AnalyticsSource>, config: &CacheConfig) -> Self {
        Self {
            inner,
            cache: Cache::builder()
                .max_capacity(config.max_capacity)
                .time_to_live(Duration::from_secs(config.ttl_secs))
                .build(),
        }
    }

    pub async fn invalidate_all(&self) {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
    }
}

#[async_trait]
impl AnalyticsSource for CachedAnalytics {
    async fn fetch_report(
        &self,
        property_id: &str,
        account: &str,
        range: DateRange,
    ) -> Result<Vec<AnalyticsRow>> {
        let key = ReportKey {
            property_id: property_id.to_string(),
            account: account.to_string(),
            range,
        };

        if let Some(cached) = self.cache.get(&key).await {
            debug!(property_id = %property_id, range = %range, "Analytics cache hit");
            metrics().analytics_cache_hits.inc();
            return Ok(cached.as_ref().clone());
        }

        let rows = self.inner.fetch_report(property_id, account, range).await?;
        self.cache.insert(key, Arc::new(rows.clone())).await;
        Ok(rows)
    }
}
