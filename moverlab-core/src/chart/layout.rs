//! Pure chart geometry, computed before anything touches a drawing backend.

use super::style::{ChartStyle, HeaderLayout, Rgb};
use super::ChartSpec;
use crate::domain::format_change;
use std::collections::BTreeSet;

/// Sign of the change, which picks the line and header colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Positive,
    Negative,
    Neutral,
}

impl Tone {
    pub fn of(pct_change: f64, epsilon: f64) -> Self {
        if pct_change > epsilon {
            Tone::Positive
        } else if pct_change < -epsilon {
            Tone::Negative
        } else {
            Tone::Neutral
        }
    }

    pub fn color(self, style: &ChartStyle) -> Rgb {
        match self {
            Tone::Positive => style.positive,
            Tone::Negative => style.negative,
            Tone::Neutral => style.neutral,
        }
    }
}

/// Indices of the labelled x ticks.
///
/// Every `max(1, len / count)`-th index, at most `count` of them, plus the
/// last index. Sorted and free of duplicates.
pub fn tick_indices(len: usize, count: usize) -> Vec<usize> {
    if len == 0 || count == 0 {
        return Vec::new();
    }
    let step = (len / count).max(1);
    let mut ticks: BTreeSet<usize> = (0..len).step_by(step).take(count).collect();
    ticks.insert(len - 1);
    ticks.into_iter().collect()
}

/// Vertical bounds that strictly contain `[min, max]`.
///
/// Padding is `(max - min) * ratio`. A flat line (or a span too small to
/// move the bounds at this magnitude) pads by `|value| * ratio` instead, never
/// less than `flat_padding`.
pub fn y_range(min: f64, max: f64, ratio: f64, flat_padding: f64) -> (f64, f64) {
    let pad = (max - min) * ratio;
    if pad > 0.0 && min - pad < min && max + pad > max {
        return (min - pad, max + pad);
    }
    let magnitude = min.abs().max(max.abs());
    let pad = (magnitude * ratio)
        .max(flat_padding)
        .max(magnitude * f64::EPSILON * 4.0);
    (min - pad, max + pad)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartLayout {
    /// `(index, close)` pairs; the x axis is the trading-day index so gaps
    /// (weekends, holidays) do not show as flat stretches.
    pub points: Vec<(f64, f64)>,
    pub x_range: (f64, f64),
    pub y_range: (f64, f64),
    /// Labelled ticks as `(index, label)`.
    pub ticks: Vec<(usize, String)>,
    pub tone: Tone,
    pub header: Vec<String>,
}

impl ChartLayout {
    /// `None` when the window has no points.
    pub fn compute(spec: &ChartSpec, style: &ChartStyle) -> Option<Self> {
        let window = spec.window.points();
        let (min, max) = spec.window.close_bounds()?;

        let points = window
            .iter()
            .enumerate()
            .map(|(i, p)| (i as f64, p.close))
            .collect();

        let x_range = if window.len() == 1 {
            (-1.0, 1.0)
        } else {
            (0.0, (window.len() - 1) as f64)
        };

        let ticks = tick_indices(window.len(), style.tick_count)
            .into_iter()
            .map(|i| (i, window[i].date.format(&style.tick_date_format).to_string()))
            .collect();

        let change = format_change(spec.pct_change, style.change_epsilon);
        let instrument = &spec.instrument;
        let header = match style.header {
            HeaderLayout::Overlay => vec![
                format!("{}  ({})", instrument.display_name, instrument.symbol),
                change,
            ],
            HeaderLayout::Title => vec![format!(
                "{}  ({}): {}",
                instrument.display_name, instrument.symbol, change
            )],
        };

        Some(Self {
            points,
            x_range,
            y_range: y_range(min, max, style.y_padding_ratio, style.flat_padding),
            ticks,
            tone: Tone::of(spec.pct_change, style.change_epsilon),
            header,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Instrument, PricePoint, PriceSeries};
    use chrono::NaiveDate;

    fn spec(closes: &[f64], pct: f64) -> ChartSpec {
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let points = closes
            .iter()
            .enumerate()
            .map(|(i, c)| PricePoint::new(start + chrono::Days::new(i as u64), *c))
            .collect();
        ChartSpec {
            instrument: Instrument::with_name("SAP.DE", "SAP"),
            window: PriceSeries::new(points).unwrap(),
            pct_change: pct,
            rank_class: None,
        }
    }

    #[test]
    fn ticks_for_thirty_points() {
        assert_eq!(tick_indices(30, 5), vec![0, 6, 12, 18, 24, 29]);
    }

    #[test]
    fn ticks_for_short_windows() {
        assert_eq!(tick_indices(1, 5), vec![0]);
        assert_eq!(tick_indices(3, 5), vec![0, 1, 2]);
        assert_eq!(tick_indices(10, 5), vec![0, 2, 4, 6, 8, 9]);
        assert!(tick_indices(0, 5).is_empty());
    }

    #[test]
    fn y_range_pads_ten_percent_of_span() {
        let (lo, hi) = y_range(100.0, 110.0, 0.1, 1e-6);
        assert!((lo - 99.0).abs() < 1e-9);
        assert!((hi - 111.0).abs() < 1e-9);
    }

    #[test]
    fn y_range_flat_line_still_has_height() {
        let (lo, hi) = y_range(50.0, 50.0, 0.1, 1e-6);
        assert!(lo < 50.0 && hi > 50.0);
        let (lo, hi) = y_range(0.0, 0.0, 0.1, 1e-6);
        assert_eq!((lo, hi), (-1e-6, 1e-6));
    }

    #[test]
    fn tone_respects_epsilon() {
        assert_eq!(Tone::of(2.55, 1e-6), Tone::Positive);
        assert_eq!(Tone::of(-1.87, 1e-6), Tone::Negative);
        assert_eq!(Tone::of(1e-9, 1e-6), Tone::Neutral);
    }

    #[test]
    fn overlay_header_has_name_symbol_and_change() {
        let layout = ChartLayout::compute(&spec(&[1.0, 2.0], 2.55), &ChartStyle::dark()).unwrap();
        assert_eq!(layout.header, vec!["SAP  (SAP.DE)".to_string(), "+2.55%".to_string()]);
        assert_eq!(layout.tone, Tone::Positive);
    }

    #[test]
    fn title_header_is_one_line() {
        let layout =
            ChartLayout::compute(&spec(&[1.0, 2.0], -1.87), &ChartStyle::plain()).unwrap();
        assert_eq!(layout.header, vec!["SAP  (SAP.DE): -1.87%".to_string()]);
    }

    #[test]
    fn tick_labels_use_day_month() {
        let layout = ChartLayout::compute(&spec(&[1.0; 3], 0.0), &ChartStyle::dark()).unwrap();
        let labels: Vec<&str> = layout.ticks.iter().map(|(_, l)| l.as_str()).collect();
        assert_eq!(labels, ["01.01.", "02.01.", "03.01."]);
        assert_eq!(layout.tone, Tone::Neutral);
    }

    #[test]
    fn single_point_gets_a_centred_x_range() {
        let layout = ChartLayout::compute(&spec(&[7.0], 0.0), &ChartStyle::dark()).unwrap();
        assert_eq!(layout.x_range, (-1.0, 1.0));
        assert_eq!(layout.points, vec![(0.0, 7.0)]);
    }

    #[test]
    fn empty_window_has_no_layout() {
        let empty = ChartSpec {
            window: PriceSeries::default(),
            ..spec(&[1.0], 0.0)
        };
        assert!(ChartLayout::compute(&empty, &ChartStyle::dark()).is_none());
    }
}
