//! Synthetic random-walk provider for demos and offline dry runs.
//!
//! Each symbol gets its own deterministic walk seeded from the base seed and
//! the symbol text, so the same request always yields the same bars.
//! Weekends are skipped; holidays are not modelled.

use super::provider::{DailyBar, DataError, DataProvider, DataSource, FetchResult};
use chrono::{Datelike, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub struct SyntheticProvider {
    seed: u64,
    start_price: f64,
    daily_vol: f64,
}

impl SyntheticProvider {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            start_price: 100.0,
            daily_vol: 0.02,
        }
    }

    fn symbol_seed(&self, symbol: &str) -> u64 {
        let hash = blake3::hash(symbol.as_bytes());
        let prefix = hash
            .as_bytes()
            .iter()
            .take(8)
            .fold(0u64, |acc, b| (acc << 8) | u64::from(*b));
        prefix ^ self.seed
    }

    fn walk(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Vec<DailyBar> {
        let mut rng = StdRng::seed_from_u64(self.symbol_seed(symbol));
        let mut price = self.start_price * rng.gen_range(0.5..5.0);
        let mut bars = Vec::new();

        let mut date = start;
        while date <= end {
            if !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
                let ret: f64 = rng.gen_range(-self.daily_vol..self.daily_vol);
                let open = price;
                price = (price * (1.0 + ret)).max(0.01);
                bars.push(DailyBar {
                    date,
                    open,
                    high: open.max(price) * 1.005,
                    low: open.min(price) * 0.995,
                    close: price,
                    volume: rng.gen_range(100_000..5_000_000),
                });
            }
            match date.succ_opt() {
                Some(next) => date = next,
                None => break,
            }
        }
        bars
    }
}

impl DataProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FetchResult, DataError> {
        let bars = self.walk(symbol, start, end);
        if bars.is_empty() {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }
        Ok(FetchResult {
            symbol: symbol.to_string(),
            bars,
            source: DataSource::Synthetic,
        })
    }

    fn is_available(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn deterministic_per_symbol() {
        let p = SyntheticProvider::new(7);
        let a = p.fetch("SAP.DE", d(2025, 1, 1), d(2025, 2, 15)).unwrap();
        let b = p.fetch("SAP.DE", d(2025, 1, 1), d(2025, 2, 15)).unwrap();
        let c = p.fetch("BMW.DE", d(2025, 1, 1), d(2025, 2, 15)).unwrap();
        assert_eq!(a.bars, b.bars);
        assert_ne!(a.bars[0].close, c.bars[0].close);
    }

    #[test]
    fn skips_weekends() {
        let p = SyntheticProvider::new(1);
        // 2025-01-04 is a Saturday, 2025-01-05 a Sunday.
        let r = p.fetch("X", d(2025, 1, 3), d(2025, 1, 6)).unwrap();
        let dates: Vec<NaiveDate> = r.bars.iter().map(|b| b.date).collect();
        assert_eq!(dates, [d(2025, 1, 3), d(2025, 1, 6)]);
        assert!(r.bars.iter().all(|b| b.close > 0.0));
    }

    #[test]
    fn weekend_only_range_is_not_found() {
        let p = SyntheticProvider::new(1);
        assert!(p.fetch("X", d(2025, 1, 4), d(2025, 1, 5)).is_err());
    }
}
