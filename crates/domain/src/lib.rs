//! Domain layer for the storefront analytics backend.
//!
//! This crate contains:
//! - The time-series completion engine (calendar sequencing, densification)
//! - Analytics domain models
//! - Analytics services and the aggregation source abstraction

pub mod models;
pub mod services;
pub mod time_series;
