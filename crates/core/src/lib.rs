//! Core types and pure logic for the publisher dashboards: URL
//! normalization, catalog / analytics reconciliation and growth comparison.

pub mod analytics;
pub mod auth;
pub mod catalog;
pub mod error;
pub mod growth;
pub mod limits;
pub mod normalize;
pub mod period;
pub mod publisher;
pub mod reconcile;
pub mod summary;

pub use analytics::*;
pub use auth::*;
pub use catalog::*;
pub use error::{Error, Result};
pub use growth::*;
pub use normalize::*;
pub use period::*;
pub use publisher::*;
pub use reconcile::*;
pub use summary::*;
