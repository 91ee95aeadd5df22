//! Time-series completion engine.
//!
//! Turns sparse, per-period aggregates into dense series:
//! - [`generate`] walks the calendar between two instants at a granularity
//! - [`densify`] merges sparse observations onto that walk, zero-filling gaps
//! - [`RawPeriodKey::normalize`] checks source keys against a granularity

mod densifier;
mod error;
mod granularity;
mod period_key;
mod sequencer;

pub use densifier::{
    densify, DenseSeries, MetricSeries, Observation, RawObservation, SeriesPoint, SparseSeries,
};
pub use error::TimeSeriesError;
pub use granularity::Granularity;
pub use period_key::{PeriodKey, RawPeriodKey};
pub use sequencer::{generate, PeriodSequence};
