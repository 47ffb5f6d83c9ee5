//! Multi-symbol time alignment.
//!
//! Closing prices for every symbol are placed on the union of all trading
//! dates. A symbol without a bar on a date gets a void (NaN) close; nothing is
//! forward-filled.

use super::provider::DailyBar;
use crate::domain::{PricePoint, PriceSeries};
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap};

/// Closing prices for several symbols on a common, ascending date axis.
#[derive(Debug, Clone, Default)]
pub struct CloseFrame {
    dates: Vec<NaiveDate>,
    /// One column per symbol, in the order the symbols were supplied.
    /// Every column has the same length as `dates`.
    columns: Vec<(String, Vec<f64>)>,
}

impl CloseFrame {
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(s, _)| s.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() || self.dates.is_empty()
    }

    pub fn column(&self, symbol: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|(s, _)| s == symbol)
            .map(|(_, c)| c.as_slice())
    }

    /// Close of `symbol` at position `index` of the date axis (NaN when void).
    pub fn close_at(&self, symbol: &str, index: usize) -> Option<f64> {
        self.column(symbol).and_then(|c| c.get(index).copied())
    }

    /// The symbol's own trading days: void entries dropped, dates ascending.
    pub fn series(&self, symbol: &str) -> Option<PriceSeries> {
        let column = self.column(symbol)?;
        let points = self
            .dates
            .iter()
            .zip(column)
            .filter(|(_, close)| close.is_finite())
            .map(|(date, close)| PricePoint::new(*date, *close))
            .collect();
        // Dates come from a BTreeSet and voids are filtered, so this cannot fail.
        PriceSeries::new(points).ok()
    }

    /// BLAKE3 hash over the date axis and every column, in column order.
    pub fn dataset_hash(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for date in &self.dates {
            hasher.update(date.to_string().as_bytes());
        }
        for (symbol, column) in &self.columns {
            hasher.update(symbol.as_bytes());
            for close in column {
                hasher.update(&close.to_le_bytes());
            }
        }
        hasher.finalize().to_hex().to_string()
    }
}

/// Align per-symbol bars to the union of their dates.
///
/// Symbols with no bars still get an all-void column so callers can tell
/// "requested but empty" apart from "never requested".
pub fn align_closes(symbol_bars: Vec<(String, Vec<DailyBar>)>) -> CloseFrame {
    let all_dates: BTreeSet<NaiveDate> = symbol_bars
        .iter()
        .flat_map(|(_, bars)| bars.iter().map(|b| b.date))
        .collect();
    let dates: Vec<NaiveDate> = all_dates.into_iter().collect();

    let columns = symbol_bars
        .into_iter()
        .map(|(symbol, bars)| {
            let by_date: HashMap<NaiveDate, f64> =
                bars.iter().map(|b| (b.date, b.close)).collect();
            let column = dates
                .iter()
                .map(|date| {
                    by_date
                        .get(date)
                        .copied()
                        .filter(|c| c.is_finite())
                        .unwrap_or(f64::NAN)
                })
                .collect();
            (symbol, column)
        })
        .collect();

    CloseFrame { dates, columns }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(date: &str, close: f64) -> DailyBar {
        DailyBar::close_only(NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(), close)
    }

    #[test]
    fn align_fills_missing_with_nan() {
        let frame = align_closes(vec![
            (
                "SAP.DE".into(),
                vec![
                    bar("2025-01-02", 100.0),
                    bar("2025-01-03", 101.0),
                    bar("2025-01-06", 102.0),
                ],
            ),
            (
                "BMW.DE".into(),
                vec![bar("2025-01-02", 80.0), bar("2025-01-06", 82.0)],
            ),
        ]);

        assert_eq!(frame.dates().len(), 3);
        assert_eq!(frame.close_at("SAP.DE", 1), Some(101.0));
        assert!(frame.close_at("BMW.DE", 1).unwrap().is_nan());
        assert_eq!(frame.series("BMW.DE").unwrap().len(), 2);
    }

    #[test]
    fn keeps_supplied_symbol_order() {
        let frame = align_closes(vec![
            ("Z".into(), vec![bar("2025-01-02", 1.0)]),
            ("A".into(), vec![bar("2025-01-02", 1.0)]),
            ("M".into(), vec![]),
        ]);
        let symbols: Vec<&str> = frame.symbols().collect();
        assert_eq!(symbols, ["Z", "A", "M"]);
        assert!(frame.series("M").unwrap().is_empty());
    }

    #[test]
    fn nan_close_from_provider_becomes_void() {
        let frame = align_closes(vec![(
            "X".into(),
            vec![bar("2025-01-02", f64::NAN), bar("2025-01-03", 5.0)],
        )]);
        assert_eq!(frame.series("X").unwrap().len(), 1);
    }

    #[test]
    fn empty_input_is_empty_frame() {
        assert!(align_closes(vec![]).is_empty());
        assert!(align_closes(vec![("A".into(), vec![])]).is_empty());
    }

    #[test]
    fn dataset_hash_is_deterministic_and_content_sensitive() {
        let make = |c: f64| align_closes(vec![("A".into(), vec![bar("2025-01-02", c)])]);
        assert_eq!(make(1.0).dataset_hash(), make(1.0).dataset_hash());
        assert_ne!(make(1.0).dataset_hash(), make(2.0).dataset_hash());
    }
}
