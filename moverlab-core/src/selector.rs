//! Top gainers and losers of a universe.
//!
//! One batch fetch over a calendar lookback, alignment on the union of
//! trading dates, and a day-over-day comparison of the last two aligned
//! dates. Per-instrument problems are recorded and skipped; only a dataset
//! with nothing to compare aborts.

use crate::chart::ChartSpec;
use crate::data::{align_closes, CloseFrame, DataProvider, Universe};
use crate::domain::{pct_change, MoverRecord, PriceSeries, RankClass};
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Calendar days fetched before `as_of`. Covers the chart window plus
    /// the comparison days with room for weekends and holidays.
    pub lookback_calendar_days: u64,
    /// Trading days kept per selected instrument.
    pub window_days: usize,
    /// Changes within this distance of zero are neither gainers nor losers.
    pub epsilon: f64,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            lookback_calendar_days: 45,
            window_days: 30,
            epsilon: 1e-6,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum SelectError {
    #[error("market data unavailable: {0}")]
    DataUnavailable(String),
}

/// An instrument left out of the ranking, and why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[error("no usable data for {symbol}: {reason}")]
pub struct InstrumentDataMissing {
    pub symbol: String,
    pub reason: String,
}

impl InstrumentDataMissing {
    fn new(symbol: &str, reason: impl Into<String>) -> Self {
        Self {
            symbol: symbol.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MoverSelection {
    /// Descending by change, at most `top_n`.
    pub gainers: Vec<MoverRecord>,
    /// Ascending by change (most negative first), at most `top_n`.
    pub losers: Vec<MoverRecord>,
    /// Trailing window per selected symbol.
    pub history: BTreeMap<String, PriceSeries>,
    pub skipped: Vec<InstrumentDataMissing>,
    pub prior_date: Option<NaiveDate>,
    pub latest_date: Option<NaiveDate>,
    pub dataset_hash: Option<String>,
}

impl MoverSelection {
    /// Gainers first, then losers, each in rank order.
    pub fn movers(&self) -> impl Iterator<Item = &MoverRecord> {
        self.gainers.iter().chain(self.losers.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.gainers.is_empty() && self.losers.is_empty()
    }

    /// Chart inputs in presentation order. Movers without history are
    /// dropped with a warning.
    pub fn chart_specs(&self) -> Vec<ChartSpec> {
        self.movers()
            .filter_map(|record| {
                let symbol = &record.instrument.symbol;
                match self.history.get(symbol) {
                    Some(window) if !window.is_empty() => {
                        Some(ChartSpec::for_mover(record, window.clone()))
                    }
                    _ => {
                        warn!(symbol = %symbol, "no trailing history; chart skipped");
                        None
                    }
                }
            })
            .collect()
    }
}

pub struct MoverSelector<'a> {
    provider: &'a dyn DataProvider,
    config: SelectorConfig,
}

impl<'a> MoverSelector<'a> {
    pub fn new(provider: &'a dyn DataProvider, config: SelectorConfig) -> Self {
        Self { provider, config }
    }

    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    pub fn select_movers(
        &self,
        universe: &Universe,
        top_n: usize,
        as_of: NaiveDate,
    ) -> Result<MoverSelection, SelectError> {
        if top_n == 0 {
            return Ok(MoverSelection::default());
        }

        let start = as_of
            .checked_sub_days(Days::new(self.config.lookback_calendar_days))
            .unwrap_or(NaiveDate::MIN);
        info!(
            provider = self.provider.name(),
            symbols = universe.len(),
            %start,
            end = %as_of,
            "fetching closes"
        );

        let batch = self.provider.fetch_batch(&universe.symbol_refs(), start, as_of);
        info!(
            succeeded = batch.succeeded(),
            failed = batch.failed(),
            "batch fetch complete"
        );

        let mut skipped = Vec::new();
        let mut fetched = Vec::new();
        for (symbol, result) in batch.results {
            match result {
                Ok(bars) => fetched.push((symbol, bars)),
                Err(e) => skipped.push(InstrumentDataMissing::new(&symbol, e.to_string())),
            }
        }

        let frame = align_closes(fetched);
        let mut selection = rank_movers(&frame, universe, top_n, &self.config)?;
        skipped.append(&mut selection.skipped);
        selection.skipped = skipped;
        Ok(selection)
    }
}

/// Rank an already aligned frame. Equal changes keep universe order.
pub fn rank_movers(
    frame: &CloseFrame,
    universe: &Universe,
    top_n: usize,
    config: &SelectorConfig,
) -> Result<MoverSelection, SelectError> {
    if top_n == 0 {
        return Ok(MoverSelection::default());
    }
    if frame.is_empty() {
        return Err(SelectError::DataUnavailable(
            "no instrument returned any closes".into(),
        ));
    }
    let dates = frame.dates();
    if dates.len() < 2 {
        return Err(SelectError::DataUnavailable(format!(
            "need 2 aligned trading days, have {}",
            dates.len()
        )));
    }
    let last = dates.len() - 1;
    let prior = last - 1;

    let mut skipped = Vec::new();
    let mut gainers = Vec::new();
    let mut losers = Vec::new();

    for symbol in frame.symbols() {
        let prior_close = frame.close_at(symbol, prior).unwrap_or(f64::NAN);
        let last_close = frame.close_at(symbol, last).unwrap_or(f64::NAN);
        let change = pct_change(prior_close, last_close);
        if !change.is_finite() {
            let reason = if !prior_close.is_finite() {
                format!("no close on {}", dates[prior])
            } else if !last_close.is_finite() {
                format!("no close on {}", dates[last])
            } else {
                format!("prior close {prior_close} gives no percentage change")
            };
            warn!(symbol = %symbol, %reason, "excluded from ranking");
            skipped.push(InstrumentDataMissing::new(symbol, reason));
            continue;
        }

        let record = |rank_class| MoverRecord {
            instrument: universe.instrument(symbol),
            pct_change: change,
            rank_class,
        };
        if change > config.epsilon {
            gainers.push(record(RankClass::Gainer));
        } else if change < -config.epsilon {
            losers.push(record(RankClass::Loser));
        }
    }

    let position = |m: &MoverRecord| universe.position(&m.instrument.symbol);
    gainers.sort_by(|a, b| {
        b.pct_change
            .total_cmp(&a.pct_change)
            .then_with(|| position(a).cmp(&position(b)))
    });
    losers.sort_by(|a, b| {
        a.pct_change
            .total_cmp(&b.pct_change)
            .then_with(|| position(a).cmp(&position(b)))
    });
    gainers.truncate(top_n);
    losers.truncate(top_n);

    let mut history = BTreeMap::new();
    for record in gainers.iter().chain(losers.iter()) {
        let symbol = &record.instrument.symbol;
        match frame.series(symbol) {
            Some(series) if !series.is_empty() => {
                history.insert(symbol.clone(), series.trailing(config.window_days));
            }
            _ => warn!(symbol = %symbol, "selected but has no usable history"),
        }
    }

    info!(
        gainers = gainers.len(),
        losers = losers.len(),
        skipped = skipped.len(),
        prior = %dates[prior],
        latest = %dates[last],
        "movers selected"
    );

    Ok(MoverSelection {
        gainers,
        losers,
        history,
        skipped,
        prior_date: Some(dates[prior]),
        latest_date: Some(dates[last]),
        dataset_hash: Some(frame.dataset_hash()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DailyBar;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, day).unwrap()
    }

    fn universe(symbols: &[&str]) -> Universe {
        Universe {
            name: "test".into(),
            symbols: symbols.iter().map(|s| s.to_string()).collect(),
            names: Default::default(),
        }
    }

    fn col(symbol: &str, closes: &[(u32, f64)]) -> (String, Vec<DailyBar>) {
        let bars = closes
            .iter()
            .map(|(day, c)| DailyBar::close_only(d(*day), *c))
            .collect();
        (symbol.to_string(), bars)
    }

    #[test]
    fn ties_keep_universe_order() {
        let f = align_closes(vec![
            col("A", &[(2, 100.0), (3, 101.0)]),
            col("B", &[(2, 100.0), (3, 101.0)]),
            col("C", &[(2, 100.0), (3, 103.0)]),
        ]);
        let s = rank_movers(&f, &universe(&["A", "B", "C"]), 5, &SelectorConfig::default()).unwrap();
        let order: Vec<&str> = s.gainers.iter().map(|m| m.instrument.symbol.as_str()).collect();
        assert_eq!(order, ["C", "A", "B"]);
    }

    #[test]
    fn missing_last_close_is_skipped_not_zero() {
        let f = align_closes(vec![
            col("A", &[(2, 100.0), (3, 90.0)]),
            col("B", &[(2, 100.0)]),
        ]);
        let s = rank_movers(&f, &universe(&["A", "B"]), 5, &SelectorConfig::default()).unwrap();
        assert_eq!(s.losers.len(), 1);
        assert_eq!(s.skipped.len(), 1);
        assert_eq!(s.skipped[0].symbol, "B");
        assert!(s.skipped[0].reason.contains("2025-01-03"));
    }

    #[test]
    fn zero_prior_close_is_skipped() {
        let f = align_closes(vec![col("Z", &[(2, 0.0), (3, 5.0)])]);
        let s = rank_movers(&f, &universe(&["Z"]), 5, &SelectorConfig::default()).unwrap();
        assert!(s.is_empty());
        assert_eq!(s.skipped.len(), 1);
    }

    #[test]
    fn single_aligned_day_is_unavailable() {
        let f = align_closes(vec![col("A", &[(2, 100.0)])]);
        let err = rank_movers(&f, &universe(&["A"]), 5, &SelectorConfig::default()).unwrap_err();
        assert!(matches!(err, SelectError::DataUnavailable(_)));
    }

    #[test]
    fn truncates_to_top_n() {
        let f = align_closes(vec![
            col("A", &[(2, 100.0), (3, 101.0)]),
            col("B", &[(2, 100.0), (3, 102.0)]),
            col("C", &[(2, 100.0), (3, 103.0)]),
        ]);
        let s = rank_movers(&f, &universe(&["A", "B", "C"]), 2, &SelectorConfig::default()).unwrap();
        assert_eq!(s.gainers.len(), 2);
        assert_eq!(s.gainers[0].instrument.symbol, "C");
        assert_eq!(s.history.len(), 2);
        assert!(!s.history.contains_key("A"));
    }

    #[test]
    fn chart_specs_are_gainers_then_losers() {
        let f = align_closes(vec![
            col("L", &[(2, 100.0), (3, 95.0)]),
            col("G", &[(2, 100.0), (3, 105.0)]),
        ]);
        let s = rank_movers(&f, &universe(&["L", "G"]), 5, &SelectorConfig::default()).unwrap();
        let specs = s.chart_specs();
        let order: Vec<&str> = specs.iter().map(|c| c.instrument.symbol.as_str()).collect();
        assert_eq!(order, ["G", "L"]);
        assert_eq!(specs[0].rank_class, Some(RankClass::Gainer));
        assert_eq!(specs[1].window.len(), 2);
    }

    #[test]
    fn chart_specs_drop_movers_without_history() {
        let f = align_closes(vec![col("G", &[(2, 100.0), (3, 105.0)])]);
        let mut s = rank_movers(&f, &universe(&["G"]), 5, &SelectorConfig::default()).unwrap();
        s.history.clear();
        assert!(s.chart_specs().is_empty());
    }

    #[test]
    fn display_names_come_from_universe() {
        let mut u = universe(&["SAP.DE"]);
        u.names = [("SAP.DE".to_string(), "SAP".to_string())].into_iter().collect();
        let f = align_closes(vec![col("SAP.DE", &[(2, 100.0), (3, 102.0)])]);
        let s = rank_movers(&f, &u, 1, &SelectorConfig::default()).unwrap();
        assert_eq!(s.gainers[0].instrument.display_name, "SAP");
    }
}
