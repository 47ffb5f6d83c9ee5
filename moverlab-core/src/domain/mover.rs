use serde::{Deserialize, Serialize};
use std::fmt;

use super::Instrument;

/// Which side of the ranking an instrument landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankClass {
    Gainer,
    Loser,
}

impl fmt::Display for RankClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RankClass::Gainer => write!(f, "gainer"),
            RankClass::Loser => write!(f, "loser"),
        }
    }
}

/// One ranked instrument with its latest one-day percentage change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoverRecord {
    pub instrument: Instrument,
    pub pct_change: f64,
    pub rank_class: RankClass,
}

/// Day-over-day change in percent.
///
/// Evaluated exactly as `(last - prior) / prior * 100`. Callers must treat a
/// non-finite result as missing data, never as zero.
pub fn pct_change(prior: f64, last: f64) -> f64 {
    (last - prior) / prior * 100.0
}

/// Signed change text with two decimals and an explicit `+` above `epsilon`.
///
/// Values within `epsilon` of zero print as `0.00%` so a tiny negative never
/// shows up as `-0.00%`.
pub fn format_change(pct: f64, epsilon: f64) -> String {
    if pct > epsilon {
        format!("+{pct:.2}%")
    } else if pct < -epsilon {
        format!("{pct:.2}%")
    } else {
        "0.00%".to_string()
    }
}
