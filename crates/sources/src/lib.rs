//! Upstream data sources for the publisher dashboards: the article catalog
//! spreadsheet and the GA4 Data API, with TTL caches in front of both.

pub mod analytics;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod health;
pub mod token;

pub use analytics::{AnalyticsSource, Ga4Client};
pub use cache::{CachedAnalytics, CachedCatalog};
pub use catalog::{parse_catalog_csv, CatalogSource, SheetCatalog};
pub use config::*;
pub use token::TokenProvider;
