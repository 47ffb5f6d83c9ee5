//! Daily closing-price series.
//!
//! A `PriceSeries` only ever holds real trading days: dates are strictly
//! increasing and every close is finite. Void days from alignment are
//! dropped before a series is built.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One trading day's closing price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self { date, close }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum SeriesError {
    #[error("dates not strictly increasing at {date}")]
    NotIncreasing { date: NaiveDate },

    #[error("non-finite close {close} on {date}")]
    NonFinite { date: NaiveDate, close: f64 },
}

/// Ordered closing prices for one instrument.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new(points: Vec<PricePoint>) -> Result<Self, SeriesError> {
        for point in &points {
            if !point.close.is_finite() {
                return Err(SeriesError::NonFinite {
                    date: point.date,
                    close: point.close,
                });
            }
        }
        for pair in points.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(SeriesError::NotIncreasing { date: pair[1].date });
            }
        }
        Ok(Self { points })
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

    pub fn first(&self) -> Option<&PricePoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    /// The most recent `n` points, or the whole series when shorter. Never pads.
    pub fn trailing(&self, n: usize) -> PriceSeries {
        let start = self.points.len().saturating_sub(n);
        PriceSeries {
            points: self.points[start..].to_vec(),
        }
    }

    /// Minimum and maximum close, `None` for an empty series.
    pub fn close_bounds(&self) -> Option<(f64, f64)> {
        let mut iter = self.points.iter().map(|p| p.close);
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), c| (lo.min(c), hi.max(c))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, day).unwrap()
    }

    fn series(n: u32) -> PriceSeries {
        PriceSeries::new((1..=n).map(|i| PricePoint::new(d(i), 100.0 + i as f64)).collect())
            .unwrap()
    }

    #[test]
    fn rejects_unsorted_dates() {
        let err = PriceSeries::new(vec![PricePoint::new(d(2), 1.0), PricePoint::new(d(1), 1.0)])
            .unwrap_err();
        assert_eq!(err, SeriesError::NotIncreasing { date: d(1) });
    }

    #[test]
    fn rejects_duplicate_dates() {
        assert!(PriceSeries::new(vec![PricePoint::new(d(2), 1.0), PricePoint::new(d(2), 2.0)])
            .is_err());
    }

    #[test]
    fn rejects_nan_close() {
        assert!(matches!(
            PriceSeries::new(vec![PricePoint::new(d(1), f64::NAN)]),
            Err(SeriesError::NonFinite { .. })
        ));
    }

    #[test]
    fn trailing_takes_most_recent() {
        let s = series(20);
        let t = s.trailing(5);
        assert_eq!(t.len(), 5);
        assert_eq!(t.first().unwrap().date, d(16));
        assert_eq!(t.last().unwrap().date, d(20));
    }

    #[test]
    fn trailing_never_pads() {
        let s = series(10);
        assert_eq!(s.trailing(30).len(), 10);
        assert_eq!(s.trailing(0).len(), 0);
    }

    #[test]
    fn bounds() {
        assert_eq!(series(3).close_bounds(), Some((101.0, 103.0)));
        assert_eq!(PriceSeries::default().close_bounds(), None);
    }
}
