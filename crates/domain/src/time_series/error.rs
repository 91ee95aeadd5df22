use thiserror::Error;

use super::{Granularity, RawPeriodKey};

/// Errors raised by the time-series engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeSeriesError {
    #[error("Invalid granularity '{0}': expected daily, monthly, quarterly or yearly")]
    InvalidGranularity(String),

    #[error("Malformed {granularity} observation key: {key}")]
    MalformedObservationKey {
        granularity: Granularity,
        key: RawPeriodKey,
    },

    #[error("Observation key {0} matches no granularity")]
    UnrecognizedKeyShape(RawPeriodKey),
}
