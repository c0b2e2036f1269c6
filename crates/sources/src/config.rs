//! Source configuration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use dashboard_core::limits::{
    ANALYTICS_MAX_PAGES, ANALYTICS_PAGE_SIZE, SOURCE_CACHE_MAX_CAPACITY, SOURCE_CACHE_TTL_SECS,
};

/// Configuration for every upstream the dashboards read from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourcesConfig {
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Published spreadsheet holding the article catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Spreadsheet ID from the sheet URL.
    #[serde(default)]
    pub spreadsheet_id: String,
    /// Base URL of the spreadsheet host
    #[serde(default = "default_catalog_base_url")]
    pub base_url: String,
    /// Request timeout in milliseconds
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_catalog_base_url() -> String {
    "https://docs.google.com".to_string()
}

fn default_request_timeout_ms() -> u64 {
    30000
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            spreadsheet_id: String::new(),
            base_url: default_catalog_base_url(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl CatalogConfig {
    /// CSV export URL of the spreadsheet.
    pub fn export_url(&self) -> String {
        format!(
            "{}/spreadsheets/d/{}/export?format=csv",
            self.base_url.trim_end_matches('/'),
            self.spreadsheet_id
        )
    }
}

/// GA4 Data API access.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Base URL of the Data API
    #[serde(default = "default_analytics_base_url")]
    pub base_url: String,
    /// OAuth2 token endpoint
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    /// Rows per `runReport` page
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Maximum pages fetched per report
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
    /// Request timeout in milliseconds
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// OAuth accounts by name; publishers pick one with `account`.
    #[serde(default)]
    pub accounts: BTreeMap<String, OAuthAccount>,
}

fn default_analytics_base_url() -> String {
    "https://analyticsdata.googleapis.com".to_string()
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

fn default_page_size() -> u32 {
    ANALYTICS_PAGE_SIZE
}

fn default_max_pages() -> u32 {
    ANALYTICS_MAX_PAGES
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            base_url: default_analytics_base_url(),
            token_uri: default_token_uri(),
            page_size: default_page_size(),
            max_pages: default_max_pages(),
            request_timeout_ms: default_request_timeout_ms(),
            accounts: BTreeMap::new(),
        }
    }
}

/// OAuth2 installed-app credentials for one Google account.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct OAuthAccount {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default)]
    pub refresh_token: String,
    /// Fixed access token; skips the refresh exchange (development only).
    #[serde(default)]
    pub access_token: Option<String>,
}

impl fmt::Debug for OAuthAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthAccount")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// TTL cache in front of both sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    #[serde(default = "default_max_capacity")]
    pub max_capacity: u64,
}

fn default_ttl_secs() -> u64 {
    SOURCE_CACHE_TTL_SECS
}

fn default_max_capacity() -> u64 {
    SOURCE_CACHE_MAX_CAPACITY
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            max_capacity: default_max_capacity(),
        }
    }
}
