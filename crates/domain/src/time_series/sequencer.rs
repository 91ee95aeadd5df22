//! Calendar sequencer: dense, ordered period keys over a date range.

use std::iter::FusedIterator;

use chrono::{DateTime, NaiveDate, Utc};

use super::{Granularity, PeriodKey};

/// Lazily generated, gap-free sequence of period keys.
///
/// Cloning yields an independent iterator positioned at the same period, so a
/// sequence can be replayed from any point.
#[derive(Debug, Clone)]
pub struct PeriodSequence {
    granularity: Granularity,
    cursor: Option<NaiveDate>,
    end: NaiveDate,
}

/// Generate every period of `granularity` from the one containing `start`
/// through the one containing `end`, inclusive.
///
/// The sequence is empty when `start` is after `end`.
pub fn generate(start: DateTime<Utc>, end: DateTime<Utc>, granularity: Granularity) -> PeriodSequence {
    let end_date = end.date_naive();
    let cursor = (start <= end).then(|| granularity.period_start(start.date_naive()));

    PeriodSequence {
        granularity,
        cursor,
        end: end_date,
    }
}

impl PeriodSequence {
    pub fn granularity(&self) -> Granularity {
        self.granularity
    }
}

impl Iterator for PeriodSequence {
    type Item = PeriodKey;

    fn next(&mut self) -> Option<PeriodKey> {
        let current = self.cursor.filter(|start| *start <= self.end)?;
        self.cursor = self.granularity.successor(current);
        Some(PeriodKey::containing(current, self.granularity))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self
            .cursor
            .map(|start| self.granularity.periods_between(start, self.end))
            .unwrap_or(0);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for PeriodSequence {}

impl FusedIterator for PeriodSequence {}
