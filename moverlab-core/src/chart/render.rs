//! Chart drawing with plotters.

use super::fonts::{self, FONT_FAMILY};
use super::layout::ChartLayout;
use super::naming::chart_file_name;
use super::style::{ChartStyle, HeaderLayout, StyleError};
use super::ChartSpec;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

const TICK_LENGTH: i32 = 10;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invalid chart style: {0}")]
    Style(#[from] StyleError),

    #[error("no price history to chart for '{symbol}'")]
    EmptyWindow { symbol: String },

    #[error("cannot create chart directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to draw {path}: {reason}")]
    Draw { path: PathBuf, reason: String },
}

/// A chart image written to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedChart {
    pub symbol: String,
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    /// Number of price points drawn.
    pub points: usize,
}

/// Renders one portrait line chart per call.
///
/// Holds no mutable state, so a single renderer can be shared across threads.
#[derive(Debug, Clone)]
pub struct ChartRenderer {
    style: ChartStyle,
    window_days: usize,
    text: bool,
}

impl ChartRenderer {
    pub fn new(style: ChartStyle) -> Result<Self, RenderError> {
        style.validate()?;
        let text = fonts::ensure_font(style.font_path.as_deref());
        Ok(Self {
            style,
            window_days: 30,
            text,
        })
    }

    /// Window length used in the file name.
    pub fn with_window_days(mut self, window_days: usize) -> Self {
        self.window_days = window_days;
        self
    }

    /// Draw line, axes, grid and ticks only.
    pub fn without_text(mut self) -> Self {
        self.text = false;
        self
    }

    pub fn style(&self) -> &ChartStyle {
        &self.style
    }

    pub fn draws_text(&self) -> bool {
        self.text
    }

    pub fn output_path(&self, symbol: &str, output_dir: &Path) -> PathBuf {
        output_dir.join(chart_file_name(symbol, self.window_days))
    }

    pub fn render(&self, spec: &ChartSpec, output_dir: &Path) -> Result<RenderedChart, RenderError> {
        let symbol = &spec.instrument.symbol;
        let layout =
            ChartLayout::compute(spec, &self.style).ok_or_else(|| RenderError::EmptyWindow {
                symbol: symbol.clone(),
            })?;

        std::fs::create_dir_all(output_dir).map_err(|source| RenderError::CreateDir {
            path: output_dir.to_path_buf(),
            source,
        })?;

        let path = self.output_path(symbol, output_dir);
        self.draw(&layout, &path)
            .map_err(|reason| RenderError::Draw {
                path: path.clone(),
                reason,
            })?;

        debug!(symbol = %symbol, path = %path.display(), points = layout.points.len(), "chart rendered");

        Ok(RenderedChart {
            symbol: symbol.clone(),
            path,
            width: self.style.width,
            height: self.style.height,
            points: layout.points.len(),
        })
    }

    fn draw(&self, layout: &ChartLayout, path: &Path) -> Result<(), String> {
        let root =
            BitMapBackend::new(path, (self.style.width, self.style.height)).into_drawing_area();
        self.draw_on(&root, layout).map_err(|e| e.to_string())?;
        root.present().map_err(|e| e.to_string())
    }

    fn draw_on<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, Shift>,
        layout: &ChartLayout,
    ) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
        let style = &self.style;
        let foreground = RGBColor::from(style.foreground);
        let line_color = RGBColor::from(layout.tone.color(style));

        root.fill(&RGBColor::from(style.background))?;

        let area = match style.frame {
            Some(frame) => {
                let (w, h) = root.dim_in_pixel();
                let m = frame.margin as i32;
                root.draw(&Rectangle::new(
                    [(m, m), (w as i32 - m, h as i32 - m)],
                    RGBColor::from(frame.color).stroke_width(frame.thickness),
                ))?;
                let inset = frame.margin + frame.thickness;
                root.margin(inset, inset, inset, inset)
            }
            None => root.margin(0, 0, 0, 0),
        };

        let line_height = style.header_font_size + style.header_font_size / 2;
        let header_height = line_height * (layout.header.len() as u32 + 1);
        let (header, body) = area.split_vertically(header_height);

        if self.text {
            let header_color = match style.header {
                HeaderLayout::Overlay => line_color,
                HeaderLayout::Title => foreground,
            };
            let font = (FONT_FAMILY, f64::from(style.header_font_size))
                .into_font()
                .color(&header_color);
            let inset = (style.header_font_size / 2) as i32;
            for (i, line) in layout.header.iter().enumerate() {
                header.draw_text(line, &font, (inset, inset + i as i32 * line_height as i32))?;
            }
        }

        let label_font = f64::from(style.label_font_size);
        let (x_area, y_area) = if self.text {
            (style.label_font_size * 4, style.label_font_size * 6)
        } else {
            (0, 0)
        };

        let mut chart = ChartBuilder::on(&body)
            .margin(style.label_font_size.max(10))
            .x_label_area_size(x_area)
            .y_label_area_size(y_area)
            .build_cartesian_2d(
                layout.x_range.0..layout.x_range.1,
                layout.y_range.0..layout.y_range.1,
            )?;

        let price_label = |v: &f64| format!("{v:.2}");
        let grid = RGBColor::from(style.grid);
        let mut mesh = chart.configure_mesh();
        mesh.x_labels(0).axis_style(foreground.stroke_width(2));
        if style.show_grid {
            mesh.light_line_style(grid.mix(0.08))
                .bold_line_style(grid.mix(0.2));
        } else {
            mesh.disable_mesh();
        }
        if self.text {
            mesh.y_labels(8)
                .y_label_formatter(&price_label)
                .label_style((FONT_FAMILY, label_font).into_font().color(&foreground))
                .x_desc(style.x_axis_label.as_str())
                .y_desc(style.y_axis_label.as_str())
                .axis_desc_style((FONT_FAMILY, label_font).into_font().color(&foreground));
        } else {
            mesh.y_labels(0);
        }
        mesh.draw()?;

        chart.draw_series(LineSeries::new(
            layout.points.iter().copied(),
            line_color.stroke_width(style.line_width),
        ))?;
        chart.draw_series(
            layout
                .points
                .last()
                .map(|&point| Circle::new(point, style.line_width + 3, line_color.filled())),
        )?;

        // Trading-day ticks are drawn by hand so labels can be dates while the
        // axis stays an index.
        let tick_font = (FONT_FAMILY, label_font)
            .into_font()
            .color(&foreground)
            .pos(Pos::new(HPos::Center, VPos::Top));
        for (index, label) in &layout.ticks {
            let (px, py) = chart.backend_coord(&(*index as f64, layout.y_range.0));
            root.draw(&PathElement::new(
                vec![(px, py), (px, py + TICK_LENGTH)],
                foreground.stroke_width(2),
            ))?;
            if self.text {
                root.draw_text(label, &tick_font, (px, py + TICK_LENGTH + 4))?;
            }
        }

        Ok(())
    }
}
