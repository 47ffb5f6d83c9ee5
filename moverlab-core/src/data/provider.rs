//! Data provider trait and structured error types.
//!
//! The DataProvider trait abstracts over data sources (Yahoo Finance, CSV
//! directory, synthetic random walks) so the selector can be driven by any of
//! them and mocked in tests.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Raw daily bar from a data provider. Only `close` feeds the ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl DailyBar {
    /// Bar for sources that only know the closing price.
    pub fn close_only(date: NaiveDate, close: f64) -> Self {
        Self {
            date,
            open: f64::NAN,
            high: f64::NAN,
            low: f64::NAN,
            close,
            volume: 0,
        }
    }
}

/// Structured error types for data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("hard stop: data provider has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("csv error for '{symbol}': {reason}")]
    Csv { symbol: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("data error: {0}")]
    Other(String),
}

/// Where the data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    YahooFinance,
    CsvImport,
    Synthetic,
}

/// Result of a successful data fetch for a single symbol.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub symbol: String,
    pub bars: Vec<DailyBar>,
    pub source: DataSource,
}

/// Outcome of one batch call: a result per requested symbol, in request order.
#[derive(Debug, Default)]
pub struct BatchFetch {
    pub results: Vec<(String, Result<Vec<DailyBar>, DataError>)>,
}

impl BatchFetch {
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|(_, r)| r.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }
}

/// Trait for market data providers.
pub trait DataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch daily bars for a symbol over an inclusive date range.
    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate)
        -> Result<FetchResult, DataError>;

    /// Check if the provider is currently available (not rate-limited, not blocked).
    fn is_available(&self) -> bool;

    /// Fetch a whole universe in one logical call.
    ///
    /// The default walks the symbols one by one, one `fetch` each; Yahoo's
    /// chart endpoint is per symbol, so it keeps the default. A provider with
    /// a true multi-symbol endpoint overrides this. Once the provider reports
    /// itself unavailable the remaining symbols fail with
    /// `CircuitBreakerTripped` instead of being requested.
    fn fetch_batch(&self, symbols: &[&str], start: NaiveDate, end: NaiveDate) -> BatchFetch {
        let mut batch = BatchFetch::default();

        for (i, symbol) in symbols.iter().enumerate() {
            if !self.is_available() {
                for rest in &symbols[i..] {
                    batch
                        .results
                        .push((rest.to_string(), Err(DataError::CircuitBreakerTripped)));
                }
                break;
            }

            let result = self.fetch(symbol, start, end).map(|r| r.bars);
            match &result {
                Ok(bars) => debug!(provider = self.name(), %symbol, bars = bars.len(), "fetched"),
                Err(e) => warn!(provider = self.name(), %symbol, error = %e, "fetch failed"),
            }
            batch.results.push((symbol.to_string(), result));
        }

        batch
    }
}
