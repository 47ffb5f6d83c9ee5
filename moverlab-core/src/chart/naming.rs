//! Chart file naming.
//!
//! `SAP.DE` → `SAP_30_day_chart.png`. The sanitized symbol never contains
//! `_`, so the video stage can split the file stem on the first `_` to get it
//! back.

use std::path::Path;

const CHART_SUFFIX: &str = "_day_chart";
pub const CHART_EXTENSION: &str = "png";

/// Strip a leading `^`, drop the exchange suffix after the last `.`, and
/// replace anything outside `[A-Za-z0-9-]` with `-`.
pub fn sanitize_symbol(symbol: &str) -> String {
    let trimmed = symbol.trim().trim_start_matches('^');
    let base = match trimmed.rsplit_once('.') {
        Some((base, _exchange)) if !base.is_empty() => base,
        _ => trimmed,
    };
    let sanitized: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' {
                c
            } else {
                '-'
            }
        })
        .collect();
    if sanitized.is_empty() {
        "symbol".to_string()
    } else {
        sanitized
    }
}

pub fn chart_file_name(symbol: &str, window_days: usize) -> String {
    format!(
        "{}_{window_days}{CHART_SUFFIX}.{CHART_EXTENSION}",
        sanitize_symbol(symbol)
    )
}

/// Recover the sanitized symbol from a path produced by [`chart_file_name`].
pub fn symbol_from_chart_path(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    let (symbol, rest) = stem.split_once('_')?;
    let days = rest.strip_suffix(CHART_SUFFIX)?;
    if symbol.is_empty() || days.is_empty() || !days.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(symbol.to_string())
}
