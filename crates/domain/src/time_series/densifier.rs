//! Series densifier: merges sparse observations onto a dense period list.

use std::collections::HashMap;

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use super::{Granularity, PeriodKey, RawPeriodKey};

/// One sparse data point as delivered by an aggregation source.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation<K, V> {
    pub key: K,
    pub value: V,
}

/// Observation whose key has not been checked against a granularity yet.
pub type RawObservation<V> = Observation<RawPeriodKey, V>;

impl<K, V> Observation<K, V> {
    pub fn new(key: K, value: V) -> Self {
        Self { key, value }
    }
}

/// Sparse per-period values for a single granularity.
#[derive(Debug, Clone)]
pub struct SparseSeries<V> {
    granularity: Granularity,
    values: HashMap<PeriodKey, V>,
    dropped: usize,
}

impl<V> SparseSeries<V> {
    /// Normalize raw observations for `granularity`.
    ///
    /// Observations whose key does not fit the granularity are dropped and
    /// counted; one bad data point never fails the whole series. When a key
    /// repeats, the last value wins.
    pub fn from_raw<I>(granularity: Granularity, observations: I) -> Self
    where
        I: IntoIterator<Item = RawObservation<V>>,
    {
        let mut values = HashMap::new();
        let mut dropped = 0;

        for observation in observations {
            match observation.key.normalize(granularity) {
                Ok(key) => {
                    values.insert(key, observation.value);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Dropping malformed observation");
                    dropped += 1;
                }
            }
        }

        Self {
            granularity,
            values,
            dropped,
        }
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    /// Number of observations rejected during normalization.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &HashMap<PeriodKey, V> {
        &self.values
    }

    /// Observed points ordered by period. Periods without data stay absent.
    pub fn into_sorted_points(self) -> Vec<SeriesPoint<V>> {
        let mut points: Vec<SeriesPoint<V>> = self
            .values
            .into_iter()
            .map(|(period, value)| SeriesPoint { period, value })
            .collect();
        points.sort_by(|a, b| a.period.cmp(&b.period));
        points
    }
}

/// A (period, value) pair of an output series.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesPoint<V> {
    pub period: PeriodKey,
    pub value: V,
}

/// Ordered series with exactly one entry per period it was built from.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseSeries<V> {
    points: Vec<SeriesPoint<V>>,
}

impl<V> DenseSeries<V> {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[SeriesPoint<V>] {
        &self.points
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SeriesPoint<V>> {
        self.points.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = PeriodKey> + '_ {
        self.points.iter().map(|p| p.period)
    }

    pub fn into_points(self) -> Vec<SeriesPoint<V>> {
        self.points
    }

    /// Attach the metric name used as the value field when serialized.
    pub fn named(self, metric: &'static str) -> MetricSeries<V> {
        MetricSeries::new(metric, self.points)
    }
}

impl<V> Default for DenseSeries<V> {
    fn default() -> Self {
        Self { points: Vec::new() }
    }
}

impl<V> IntoIterator for DenseSeries<V> {
    type Item = SeriesPoint<V>;
    type IntoIter = std::vec::IntoIter<SeriesPoint<V>>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.into_iter()
    }
}

/// Fill `periods` with values from `observations`, using `default` where a
/// period has no observation.
///
/// The output follows `periods` exactly, in order and length. Observations
/// for periods outside `periods` are ignored.
pub fn densify<V, I>(observations: &HashMap<PeriodKey, V>, periods: I, default: V) -> DenseSeries<V>
where
    V: Clone,
    I: IntoIterator<Item = PeriodKey>,
{
    let points = periods
        .into_iter()
        .map(|period| SeriesPoint {
            value: observations.get(&period).cloned().unwrap_or_else(|| default.clone()),
            period,
        })
        .collect();

    DenseSeries { points }
}

/// Period-ordered points serialized as
/// `[{"_id": {...}, "<metric>": value}, ...]`.
///
/// Dense when built from a [`DenseSeries`], otherwise only the observed
/// periods.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSeries<V> {
    metric: &'static str,
    points: Vec<SeriesPoint<V>>,
}

impl<V> MetricSeries<V> {
    pub fn new(metric: &'static str, points: Vec<SeriesPoint<V>>) -> Self {
        Self { metric, points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[SeriesPoint<V>] {
        &self.points
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SeriesPoint<V>> {
        self.points.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = PeriodKey> + '_ {
        self.points.iter().map(|p| p.period)
    }
}

struct NamedPoint<'a, V> {
    metric: &'static str,
    point: &'a SeriesPoint<V>,
}

impl<V: Serialize> Serialize for NamedPoint<'_, V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("_id", &self.point.period)?;
        map.serialize_entry(self.metric, &self.point.value)?;
        map.end()
    }
}

impl<V: Serialize> Serialize for MetricSeries<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.points.len()))?;
        for point in &self.points {
            seq.serialize_element(&NamedPoint {
                metric: self.metric,
                point,
            })?;
        }
        seq.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time_series::generate;
    use chrono::{TimeZone, Utc};
    use fake::Fake;

    fn month(year: i32, month: u32) -> PeriodKey {
        PeriodKey::Month { year, month }
    }

    #[test]
    fn test_densify_zero_fills_missing_periods() {
        let start = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap();
        let periods = generate(start, end, Granularity::Monthly);

        let observations = HashMap::from([(month(2024, 2), 5)]);
        let series = densify(&observations, periods, 0);

        let pairs: Vec<(PeriodKey, i64)> = series.iter().map(|p| (p.period, p.value)).collect();
        assert_eq!(
            pairs,
            vec![(month(2024, 1), 0), (month(2024, 2), 5), (month(2024, 3), 0)]
        );
    }

    #[test]
    fn test_densify_ignores_out_of_range_observations() {
        let periods = vec![month(2024, 1), month(2024, 2)];
        let observations = HashMap::from([
            (month(2023, 12), 9),
            (month(2024, 2), 3),
            (PeriodKey::Quarter { year: 2024, quarter: 1 }, 7),
        ]);

        let series = densify(&observations, periods.clone(), 0);
        assert_eq!(series.keys().collect::<Vec<_>>(), periods);
        assert_eq!(series.iter().map(|p| p.value).sum::<i32>(), 3);
    }

    #[test]
    fn test_densify_never_reorders() {
        // Periods given out of calendar order are kept as given.
        let periods = vec![month(2024, 3), month(2024, 1), month(2024, 2)];
        let observations = HashMap::from([(month(2024, 1), 1.5)]);
        let series = densify(&observations, periods.clone(), 0.0);
        assert_eq!(series.keys().collect::<Vec<_>>(), periods);
        assert_eq!(series.points()[1].value, 1.5);
    }

    #[test]
    fn test_densify_empty_periods() {
        let observations = HashMap::from([(month(2024, 1), 1)]);
        let series = densify(&observations, Vec::new(), 0);
        assert!(series.is_empty());
    }

    #[test]
    fn test_densify_preserves_length_for_random_observations() {
        let start = Utc.with_ymd_and_hms(2022, 3, 4, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2023, 9, 20, 0, 0, 0).unwrap();

        for granularity in Granularity::ALL {
            let periods: Vec<PeriodKey> = generate(start, end, granularity).collect();
            let mut observations = HashMap::new();
            for _ in 0..50 {
                let idx: usize = (0..periods.len()).fake();
                let count: i64 = (1..1000).fake();
                observations.insert(periods[idx], count);
            }

            let series = densify(&observations, periods.clone(), 0);
            assert_eq!(series.len(), periods.len());
            assert_eq!(series.keys().collect::<Vec<_>>(), periods);
            for point in series.iter() {
                let expected = observations.get(&point.period).copied().unwrap_or(0);
                assert_eq!(point.value, expected);
            }
        }
    }

    #[test]
    fn test_sparse_series_drops_malformed_keys() {
        let raw = vec![
            Observation::new(RawPeriodKey::month(2024, 1), 4),
            Observation::new(RawPeriodKey::month(2024, 13), 8),
            Observation::new(RawPeriodKey::quarter(2024, 1), 2),
            Observation::new(RawPeriodKey::month(2024, 2), 6),
        ];

        let sparse = SparseSeries::from_raw(Granularity::Monthly, raw);
        assert_eq!(sparse.len(), 2);
        assert_eq!(sparse.dropped(), 2);
        assert_eq!(sparse.values().get(&month(2024, 2)), Some(&6));
    }

    #[test]
    fn test_sparse_series_last_duplicate_wins() {
        let raw = vec![
            Observation::new(RawPeriodKey::year(2024), 1),
            Observation::new(RawPeriodKey::year(2024), 2),
        ];
        let sparse = SparseSeries::from_raw(Granularity::Yearly, raw);
        assert_eq!(sparse.len(), 1);
        assert_eq!(sparse.values().get(&PeriodKey::Year { year: 2024 }), Some(&2));
    }

    #[test]
    fn test_sorted_points_keep_gaps() {
        let raw = vec![
            Observation::new(RawPeriodKey::month(2024, 3), 3),
            Observation::new(RawPeriodKey::month(2023, 12), 1),
            Observation::new(RawPeriodKey::month(2024, 1), 2),
        ];
        let sorted = SparseSeries::from_raw(Granularity::Monthly, raw).into_sorted_points();
        let values: Vec<i32> = sorted.into_iter().map(|p| p.value).collect();
        // 2024-02 has no observation and is not filled in
        assert_eq!(values, vec![1, 2, 3]);
    }

    #[test]
    fn test_metric_series_serialization() {
        let observations = HashMap::from([(month(2024, 2), 5)]);
        let series = densify(&observations, vec![month(2024, 1), month(2024, 2)], 0);
        let json = serde_json::to_value(series.named("repeat_customers")).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                {"_id": {"year": 2024, "month": 1}, "repeat_customers": 0},
                {"_id": {"year": 2024, "month": 2}, "repeat_customers": 5},
            ])
        );
    }

    #[test]
    fn test_sparse_metric_series_serialization() {
        let raw = vec![
            Observation::new(RawPeriodKey::quarter(2024, 3), 2.5),
            Observation::new(RawPeriodKey::quarter(2023, 4), 1.0),
        ];
        let points = SparseSeries::from_raw(Granularity::Quarterly, raw).into_sorted_points();
        let series = MetricSeries::new("total_sales", points);

        assert_eq!(series.len(), 2);
        assert_eq!(
            serde_json::to_value(&series).unwrap(),
            serde_json::json!([
                {"_id": {"year": 2023, "quarter": 4}, "total_sales": 1.0},
                {"_id": {"year": 2024, "quarter": 3}, "total_sales": 2.5},
            ])
        );
    }
}
