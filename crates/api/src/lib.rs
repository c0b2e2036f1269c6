//! HTTP API layer for the publisher dashboards.

pub mod extractors;
pub mod middleware;
pub mod pipeline;
pub mod response;
pub mod routes;
pub mod state;

pub use middleware::rate_limit::RateLimitConfig;
pub use routes::router;
pub use state::{AppState, SessionStore};
