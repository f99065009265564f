//! Price and return series types.
//!
//! A [`PriceSeries`] is an ordered, duplicate-free run of daily adjusted closes
//! for one symbol. A [`ReturnSeries`] is derived from it (see [`crate::returns`])
//! and is always one observation shorter.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::StatsError;

/// Default analysis window start (inclusive).
pub const DEFAULT_WINDOW_START: (i32, u32, u32) = (2023, 3, 19);
/// Default analysis window end (exclusive).
pub const DEFAULT_WINDOW_END: (i32, u32, u32) = (2024, 3, 19);

/// A date window. `start` is inclusive, `end` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, StatsError> {
        if start >= end {
            return Err(StatsError::InvalidInput(format!(
                "window start {} must be before end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date < self.end
    }
}

impl Default for DateRange {
    fn default() -> Self {
        let (sy, sm, sd) = DEFAULT_WINDOW_START;
        let (ey, em, ed) = DEFAULT_WINDOW_END;
        Self {
            start: NaiveDate::from_ymd_opt(sy, sm, sd).unwrap_or_default(),
            end: NaiveDate::from_ymd_opt(ey, em, ed).unwrap_or_default(),
        }
    }
}

/// One daily observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub adj_close: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, adj_close: f64) -> Self {
        Self { date, adj_close }
    }
}

/// Ordered daily adjusted-close prices for one symbol.
///
/// Dates are strictly increasing. The series is immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    symbol: String,
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Build from points that must already be strictly increasing by date.
    pub fn new(symbol: impl Into<String>, points: Vec<PricePoint>) -> Result<Self, StatsError> {
        let symbol = symbol.into();
        for pair in points.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(StatsError::InvalidInput(format!(
                    "{}: dates must be strictly increasing ({} follows {})",
                    symbol, pair[1].date, pair[0].date
                )));
            }
        }
        Ok(Self { symbol, points })
    }

    /// Build from provider output in arbitrary order. Sorts by date and keeps
    /// the last observation for any repeated date.
    pub fn from_unsorted(symbol: impl Into<String>, mut points: Vec<PricePoint>) -> Self {
        // stable sort keeps provider order within a date, so the later one wins
        points.sort_by_key(|p| p.date);
        let mut deduped: Vec<PricePoint> = Vec::with_capacity(points.len());
        for point in points {
            match deduped.last_mut() {
                Some(last) if last.date == point.date => *last = point,
                _ => deduped.push(point),
            }
        }
        Self {
            symbol: symbol.into(),
            points: deduped,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.points.iter().map(|p| p.date)
    }

    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.adj_close).collect()
    }

    /// Most recent observation, if any.
    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    /// Whether both series cover exactly the same dates.
    pub fn same_dates(&self, other: &PriceSeries) -> bool {
        self.len() == other.len() && self.dates().eq(other.dates())
    }

    /// Restrict to the dates present in `other`.
    pub fn restrict_to(&self, other: &PriceSeries) -> PriceSeries {
        let keep: HashSet<NaiveDate> = other.dates().collect();
        PriceSeries {
            symbol: self.symbol.clone(),
            points: self
                .points
                .iter()
                .filter(|p| keep.contains(&p.date))
                .copied()
                .collect(),
        }
    }
}

/// One simple daily return aligned to the later of its two price dates.
/// `value` is NaN when the return is undefined.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReturnPoint {
    pub date: NaiveDate,
    pub value: f64,
}

impl ReturnPoint {
    pub fn is_defined(&self) -> bool {
        self.value.is_finite()
    }
}

/// Simple fractional daily returns derived from a [`PriceSeries`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnSeries {
    symbol: String,
    points: Vec<ReturnPoint>,
}

impl ReturnSeries {
    pub(crate) fn from_points(symbol: String, points: Vec<ReturnPoint>) -> Self {
        Self { symbol, points }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn points(&self) -> &[ReturnPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    /// Values with undefined entries removed.
    pub fn defined_values(&self) -> Vec<f64> {
        self.points
            .iter()
            .filter(|p| p.is_defined())
            .map(|p| p.value)
            .collect()
    }

    pub fn same_dates(&self, other: &ReturnSeries) -> bool {
        self.len() == other.len()
            && self
                .points
                .iter()
                .zip(other.points.iter())
                .all(|(a, b)| a.date == b.date)
    }
}
