//! Repository implementations for database operations.

pub mod analytics;

pub use analytics::AnalyticsRepository;
