//! Portrait line charts for individual movers.
//!
//! - `style`: palette, canvas and preset configuration
//! - `layout`: pure geometry (y range, ticks, header text, line colour)
//! - `naming`: output file naming and its inverse
//! - `fonts`: one-time TrueType registration for text
//! - `render`: drawing with plotters

pub mod fonts;
pub mod layout;
pub mod naming;
pub mod render;
pub mod style;

pub use layout::{tick_indices, y_range, ChartLayout, Tone};
pub use naming::{chart_file_name, sanitize_symbol, symbol_from_chart_path};
pub use render::{ChartRenderer, RenderError, RenderedChart};
pub use style::{ChartStyle, FrameStyle, HeaderLayout, Rgb, StyleError, StylePreset};

use crate::domain::{Instrument, MoverRecord, PriceSeries, RankClass};

/// Everything the renderer needs for one chart.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub instrument: Instrument,
    pub window: PriceSeries,
    pub pct_change: f64,
    /// `None` when the chart is requested outside a mover ranking.
    pub rank_class: Option<RankClass>,
}

impl ChartSpec {
    pub fn for_mover(record: &MoverRecord, window: PriceSeries) -> Self {
        Self {
            instrument: record.instrument.clone(),
            window,
            pct_change: record.pct_change,
            rank_class: Some(record.rank_class),
        }
    }
}
