//! Period-over-period growth derivation.

use crate::time_series::{PeriodKey, SeriesPoint};

/// A value with its percentage change from the preceding entry.
#[derive(Debug, Clone, PartialEq)]
pub struct GrowthPoint {
    pub period: PeriodKey,
    pub value: f64,
    /// `None` for the first entry and whenever the previous value is zero.
    pub growth_rate: Option<f64>,
}

/// Percentage change from `previous` to `current`, undefined for a zero base.
pub fn growth_rate(previous: f64, current: f64) -> Option<f64> {
    if previous == 0.0 {
        None
    } else {
        Some((current - previous) / previous * 100.0)
    }
}

/// Compute growth for each entry relative to the entry before it.
///
/// Works on sparse or dense input: the predecessor is simply the previous
/// element, whatever period it belongs to.
pub fn derive_growth<I>(points: I) -> Vec<GrowthPoint>
where
    I: IntoIterator<Item = SeriesPoint<f64>>,
{
    let mut previous: Option<f64> = None;

    points
        .into_iter()
        .map(|point| {
            let growth = previous.and_then(|prev| growth_rate(prev, point.value));
            previous = Some(point.value);
            GrowthPoint {
                period: point.period,
                value: point.value,
                growth_rate: growth,
            }
        })
        .collect()
}
