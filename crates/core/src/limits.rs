//! Shared limits and defaults.
//!
//! The `#[validate]` derive macro requires literal values in attributes,
//! so the publisher field limits are duplicated in `publisher.rs`. Keep both
//! in sync when modifying.

// === Analytics ===

/// Rows requested per `runReport` page (the API maximum is 100k; 10k keeps
/// responses small).
pub const ANALYTICS_PAGE_SIZE: u32 = 10_000;

/// Hard stop on pagination so a runaway report can't pin a request.
pub const ANALYTICS_MAX_PAGES: u32 = 20;

/// Default report window when the request gives none.
pub const DEFAULT_START_DATE: &str = "30daysAgo";
pub const DEFAULT_END_DATE: &str = "today";

// === Caching ===

/// Catalog and analytics cache window (5 minutes).
pub const SOURCE_CACHE_TTL_SECS: u64 = 300;

/// Maximum cached analytics reports (one per property and range).
pub const SOURCE_CACHE_MAX_CAPACITY: u64 = 1_000;

/// Refresh an OAuth access token this many seconds before it expires.
pub const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;

// === Sessions ===

/// Session lifetime (8 hours).
pub const SESSION_TTL_SECS: u64 = 8 * 60 * 60;

/// Maximum concurrent sessions held in memory.
pub const SESSION_MAX_CAPACITY: u64 = 10_000;

/// Login attempts allowed per client per minute.
pub const LOGIN_ATTEMPTS_PER_MINUTE: u32 = 10;

// === Presentation ===

/// Top pages shown when the request does not say.
pub const DEFAULT_TOP_N: usize = 20;

/// Upper bound for the `top` query parameter.
pub const MAX_TOP_N: usize = 50;

/// Monthly page view goal when the publisher config has none.
pub const DEFAULT_MONTHLY_GOAL: u64 = 3_000_000;

/// Paths excluded from the domain-wide comparison.
pub const HOME_PATHS: [&str; 3] = ["/", "/index.html", "/home"];

// === Publisher config ===

/// Slug max length.
pub const MAX_SLUG_LEN: usize = 64;

/// Display name max length.
pub const MAX_PUBLISHER_NAME_LEN: usize = 200;
