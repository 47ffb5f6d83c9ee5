//! Offline provider reading one CSV file per symbol.
//!
//! Layout: `<dir>/<SYMBOL>.csv` with a header row containing at least `Date`
//! (`YYYY-MM-DD`) and `Close`. `Open`, `High`, `Low` and `Volume` are picked
//! up when present, so Yahoo's own CSV export can be dropped in unchanged.
//! Unparseable numeric cells (e.g. `null`) become void values.

use super::provider::{DailyBar, DataError, DataProvider, DataSource, FetchResult};
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(alias = "date")]
    #[serde(rename = "Date")]
    date: NaiveDate,
    #[serde(alias = "close", rename = "Close", deserialize_with = "csv::invalid_option")]
    close: Option<f64>,
    #[serde(alias = "open", rename = "Open", default, deserialize_with = "csv::invalid_option")]
    open: Option<f64>,
    #[serde(alias = "high", rename = "High", default, deserialize_with = "csv::invalid_option")]
    high: Option<f64>,
    #[serde(alias = "low", rename = "Low", default, deserialize_with = "csv::invalid_option")]
    low: Option<f64>,
    #[serde(alias = "volume", rename = "Volume", default, deserialize_with = "csv::invalid_option")]
    volume: Option<f64>,
}

pub struct CsvProvider {
    dir: PathBuf,
}

impl CsvProvider {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{symbol}.csv"))
    }

    fn read_bars(&self, symbol: &str) -> Result<Vec<DailyBar>, DataError> {
        let path = self.path_for(symbol);
        if !path.exists() {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }

        let csv_err = |e: csv::Error| DataError::Csv {
            symbol: symbol.to_string(),
            reason: e.to_string(),
        };

        let mut reader = csv::Reader::from_path(&path).map_err(csv_err)?;
        let mut bars = Vec::new();
        for row in reader.deserialize::<CsvRow>() {
            let row = row.map_err(csv_err)?;
            bars.push(DailyBar {
                date: row.date,
                open: row.open.unwrap_or(f64::NAN),
                high: row.high.unwrap_or(f64::NAN),
                low: row.low.unwrap_or(f64::NAN),
                close: row.close.unwrap_or(f64::NAN),
                volume: row.volume.map(|v| v.max(0.0) as u64).unwrap_or(0),
            });
        }
        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }
}

impl DataProvider for CsvProvider {
    fn name(&self) -> &str {
        "csv_import"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FetchResult, DataError> {
        let bars: Vec<DailyBar> = self
            .read_bars(symbol)?
            .into_iter()
            .filter(|b| b.date >= start && b.date <= end)
            .collect();

        if bars.is_empty() {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }

        Ok(FetchResult {
            symbol: symbol.to_string(),
            bars,
            source: DataSource::CsvImport,
        })
    }

    fn is_available(&self) -> bool {
        self.dir.is_dir()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn reads_yahoo_export_layout() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("SAP.DE.csv"),
            "Date,Open,High,Low,Close,Adj Close,Volume\n\
             2025-01-03,241,243,240,242.5,242.5,1000\n\
             2025-01-02,240,242,238,241.0,241.0,1200\n\
             2025-01-06,null,null,null,null,null,null\n",
        )
        .unwrap();

        let provider = CsvProvider::new(dir.path());
        let result = provider
            .fetch("SAP.DE", d("2025-01-01"), d("2025-01-31"))
            .unwrap();

        assert_eq!(result.source, DataSource::CsvImport);
        assert_eq!(result.bars.len(), 3);
        assert_eq!(result.bars[0].date, d("2025-01-02"));
        assert_eq!(result.bars[1].close, 242.5);
        assert!(result.bars[2].close.is_nan());
    }

    #[test]
    fn minimal_date_close_layout_and_range_filter() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("X.csv"),
            "date,close\n2024-12-30,10\n2025-01-02,11\n",
        )
        .unwrap();

        let provider = CsvProvider::new(dir.path());
        let result = provider.fetch("X", d("2025-01-01"), d("2025-01-31")).unwrap();
        assert_eq!(result.bars.len(), 1);
        assert_eq!(result.bars[0].close, 11.0);
        assert!(result.bars[0].open.is_nan());
    }

    #[test]
    fn missing_file_is_symbol_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let provider = CsvProvider::new(dir.path());
        let err = provider
            .fetch("NOPE", d("2025-01-01"), d("2025-01-31"))
            .unwrap_err();
        assert!(matches!(err, DataError::SymbolNotFound { .. }));
    }

    #[test]
    fn malformed_row_is_csv_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("B.csv"), "Date,Close\nnot-a-date,1\n").unwrap();
        let provider = CsvProvider::new(dir.path());
        let err = provider
            .fetch("B", d("2025-01-01"), d("2025-01-31"))
            .unwrap_err();
        assert!(matches!(err, DataError::Csv { .. }));
    }
}
