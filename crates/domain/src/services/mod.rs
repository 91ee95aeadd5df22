//! Domain services for storefront analytics.
//!
//! Services contain business logic that operates on domain models.

pub mod analytics;
pub mod growth;
pub mod source;

pub use analytics::AnalyticsService;
pub use growth::{derive_growth, growth_rate, GrowthPoint};
pub use source::{AnalyticsSource, DataSourceError, StaticAnalyticsSource};
