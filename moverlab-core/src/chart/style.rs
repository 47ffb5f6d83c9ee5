//! Chart style configuration.
//!
//! The plain, dark and framed looks are the same renderer with different
//! settings. Every field has a default so a TOML `[chart]` section only needs
//! the values it changes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// 8-bit RGB colour; serialized as `[r, g, b]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl From<Rgb> for plotters::style::RGBColor {
    fn from(c: Rgb) -> Self {
        plotters::style::RGBColor(c.0, c.1, c.2)
    }
}

/// How the name/symbol/change header is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderLayout {
    /// Two large lines in the line colour: "Name  (SYMBOL)" then "+2.55%".
    Overlay,
    /// One compact title line: "Name (SYMBOL): +2.55%".
    Title,
}

/// Letterbox frame drawn around the whole chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameStyle {
    pub margin: u32,
    pub thickness: u32,
    pub color: Rgb,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StylePreset {
    Dark,
    Plain,
    Framed,
}

impl StylePreset {
    pub fn style(self) -> ChartStyle {
        match self {
            StylePreset::Dark => ChartStyle::dark(),
            StylePreset::Plain => ChartStyle::plain(),
            StylePreset::Framed => ChartStyle::framed(),
        }
    }
}

impl FromStr for StylePreset {
    type Err = StyleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dark" => Ok(StylePreset::Dark),
            "plain" => Ok(StylePreset::Plain),
            "framed" => Ok(StylePreset::Framed),
            other => Err(StyleError::UnknownPreset(other.to_string())),
        }
    }
}

impl fmt::Display for StylePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StylePreset::Dark => "dark",
            StylePreset::Plain => "plain",
            StylePreset::Framed => "framed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum StyleError {
    #[error("unknown style preset '{0}' (valid: dark, plain, framed)")]
    UnknownPreset(String),

    #[error("canvas {width}x{height} is not a 9:16 portrait ratio")]
    AspectRatio { width: u32, height: u32 },

    #[error("{field} must be positive")]
    NotPositive { field: &'static str },

    #[error("frame margin {margin} leaves no room on a {width}px wide canvas")]
    FrameTooWide { margin: u32, width: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartStyle {
    pub width: u32,
    pub height: u32,
    pub background: Rgb,
    /// Axes, tick labels and axis descriptions.
    pub foreground: Rgb,
    pub positive: Rgb,
    pub negative: Rgb,
    pub neutral: Rgb,
    pub line_width: u32,
    pub header: HeaderLayout,
    pub header_font_size: u32,
    pub label_font_size: u32,
    pub show_grid: bool,
    pub grid: Rgb,
    pub tick_count: usize,
    pub tick_date_format: String,
    /// Fraction of the data range added above and below the line.
    pub y_padding_ratio: f64,
    /// Smallest padding used when the line is flat.
    pub flat_padding: f64,
    /// Changes within this distance of zero use the neutral colour.
    pub change_epsilon: f64,
    pub x_axis_label: String,
    pub y_axis_label: String,
    pub frame: Option<FrameStyle>,
    /// TrueType font for all text. Falls back to common system locations.
    pub font_path: Option<PathBuf>,
}

impl ChartStyle {
    /// Black background, lime/red/grey line, large overlay header.
    pub fn dark() -> Self {
        Self {
            width: 1080,
            height: 1920,
            background: Rgb(0, 0, 0),
            foreground: Rgb(255, 255, 255),
            positive: Rgb(50, 205, 50),
            negative: Rgb(255, 0, 0),
            neutral: Rgb(128, 128, 128),
            line_width: 4,
            header: HeaderLayout::Overlay,
            header_font_size: 42,
            label_font_size: 14,
            show_grid: true,
            grid: Rgb(255, 255, 255),
            tick_count: 5,
            tick_date_format: "%d.%m.".into(),
            y_padding_ratio: 0.1,
            flat_padding: 1e-6,
            change_epsilon: 1e-6,
            x_axis_label: "Date".into(),
            y_axis_label: "Price (EUR)".into(),
            frame: None,
            font_path: None,
        }
    }

    /// White background, green/red/blue line, single title line.
    pub fn plain() -> Self {
        Self {
            background: Rgb(255, 255, 255),
            foreground: Rgb(0, 0, 0),
            positive: Rgb(0, 128, 0),
            negative: Rgb(255, 0, 0),
            neutral: Rgb(0, 0, 255),
            line_width: 2,
            header: HeaderLayout::Title,
            header_font_size: 16,
            label_font_size: 12,
            grid: Rgb(128, 128, 128),
            ..Self::dark()
        }
    }

    /// Dark palette inside a letterbox frame.
    pub fn framed() -> Self {
        Self {
            frame: Some(FrameStyle {
                margin: 60,
                thickness: 6,
                color: Rgb(255, 255, 255),
            }),
            ..Self::dark()
        }
    }

    pub fn validate(&self) -> Result<(), StyleError> {
        if self.width == 0 {
            return Err(StyleError::NotPositive { field: "width" });
        }
        if self.height == 0 {
            return Err(StyleError::NotPositive { field: "height" });
        }
        if u64::from(self.width) * 16 != u64::from(self.height) * 9 {
            return Err(StyleError::AspectRatio {
                width: self.width,
                height: self.height,
            });
        }
        if self.line_width == 0 {
            return Err(StyleError::NotPositive {
                field: "line_width",
            });
        }
        if self.tick_count == 0 {
            return Err(StyleError::NotPositive {
                field: "tick_count",
            });
        }
        if !(self.y_padding_ratio.is_finite() && self.y_padding_ratio > 0.0) {
            return Err(StyleError::NotPositive {
                field: "y_padding_ratio",
            });
        }
        if !(self.flat_padding.is_finite() && self.flat_padding > 0.0) {
            return Err(StyleError::NotPositive {
                field: "flat_padding",
            });
        }
        if let Some(frame) = &self.frame {
            if frame.margin.saturating_mul(4) >= self.width {
                return Err(StyleError::FrameTooWide {
                    margin: frame.margin,
                    width: self.width,
                });
            }
        }
        Ok(())
    }
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self::dark()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_valid_and_share_dimensions() {
        for preset in [StylePreset::Dark, StylePreset::Plain, StylePreset::Framed] {
            let style = preset.style();
            style.validate().unwrap();
            assert_eq!((style.width, style.height), (1080, 1920));
        }
    }

    #[test]
    fn rejects_landscape_canvas() {
        let style = ChartStyle {
            width: 1920,
            height: 1080,
            ..ChartStyle::dark()
        };
        assert_eq!(
            style.validate(),
            Err(StyleError::AspectRatio {
                width: 1920,
                height: 1080
            })
        );
    }

    #[test]
    fn accepts_smaller_portrait_canvas() {
        let style = ChartStyle {
            width: 720,
            height: 1280,
            ..ChartStyle::plain()
        };
        assert!(style.validate().is_ok());
    }

    #[test]
    fn rejects_zero_padding() {
        let style = ChartStyle {
            y_padding_ratio: 0.0,
            ..ChartStyle::dark()
        };
        assert!(matches!(
            style.validate(),
            Err(StyleError::NotPositive {
                field: "y_padding_ratio"
            })
        ));
    }

    #[test]
    fn preset_names_parse() {
        assert_eq!("Framed".parse::<StylePreset>(), Ok(StylePreset::Framed));
        assert!("neon".parse::<StylePreset>().is_err());
        assert_eq!(StylePreset::Plain.to_string(), "plain");
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let style: ChartStyle = toml::from_str("line_width = 6\nbackground = [10, 20, 30]").unwrap();
        assert_eq!(style.line_width, 6);
        assert_eq!(style.background, Rgb(10, 20, 30));
        assert_eq!(style.width, 1080);
    }
}
