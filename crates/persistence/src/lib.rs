//! Persistence layer for the storefront analytics backend.
//!
//! This crate contains:
//! - Database connection management
//! - Entity definitions (database row mappings)
//! - The PostgreSQL analytics source
//! - Query metrics

pub mod db;
pub mod entities;
pub mod metrics;
pub mod repositories;
