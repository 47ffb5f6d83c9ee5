//! Pipeline configuration, loaded from TOML.
//!
//! Every section has a default, so an empty file is a valid configuration:
//! DAX 40, top 5, Yahoo Finance, dark charts, ffmpeg video.

use moverlab_core::chart::{ChartStyle, StyleError, StylePreset};
use moverlab_core::data::{Universe, UniverseError};
use moverlab_core::SelectorConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("cannot serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid universe: {0}")]
    Universe(#[from] UniverseError),

    #[error("invalid chart style: {0}")]
    Style(#[from] StyleError),

    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSourceKind {
    Yahoo,
    Csv,
    Synthetic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub source: DataSourceKind,
    /// Directory of `<SYMBOL>.csv` files when `source = "csv"`.
    pub csv_dir: Option<PathBuf>,
    /// Seed for `source = "synthetic"`.
    pub seed: u64,
    /// HTTP timeout for Yahoo requests.
    pub timeout_secs: u64,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            source: DataSourceKind::Yahoo,
            csv_dir: None,
            seed: 42,
            timeout_secs: 30,
        }
    }
}

/// Chart look. `style`, when present, replaces the preset entirely; its
/// missing fields fall back to the dark preset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub preset: StylePreset,
    pub style: Option<ChartStyle>,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            preset: StylePreset::Dark,
            style: None,
        }
    }
}

impl ChartConfig {
    pub fn resolve(&self) -> ChartStyle {
        self.style.clone().unwrap_or_else(|| self.preset.style())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    pub enabled: bool,
    pub ffmpeg: PathBuf,
    pub seconds_per_chart: f64,
    pub intro_seconds: f64,
    pub outro_seconds: f64,
    pub fps: u32,
    /// `{date}` is replaced with the run date as `DD.MM.YYYY`.
    pub intro_text: String,
    pub outro_text: String,
    /// Background music; looped or cut to the video length.
    pub audio: Option<PathBuf>,
    /// Font for the text overlays burned into the video.
    pub font_file: Option<PathBuf>,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ffmpeg: PathBuf::from("ffmpeg"),
            seconds_per_chart: 4.0,
            intro_seconds: 3.0,
            outro_seconds: 3.0,
            fps: 24,
            intro_text: "DAX Top Movers {date}".into(),
            outro_text: "Daily DAX updates. Follow for more!".into(),
            audio: Some(PathBuf::from("music/background_music.mp3")),
            font_file: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub charts_dir: PathBuf,
    pub videos_dir: PathBuf,
    /// Daily log files go here when set.
    pub log_dir: Option<PathBuf>,
    /// Video and manifest files are `<prefix>_<YYYY-MM-DD>.{mp4,json}`.
    pub video_prefix: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            charts_dir: PathBuf::from("charts"),
            videos_dir: PathBuf::from("videos"),
            log_dir: Some(PathBuf::from("logs")),
            video_prefix: "dax_top_movers".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub top_n: usize,
    /// Keep chart files after the video is assembled.
    pub keep_charts: bool,
    /// Render charts on the rayon pool.
    pub parallel: bool,
    pub universe: Universe,
    pub selector: SelectorConfig,
    pub data: DataConfig,
    pub chart: ChartConfig,
    pub video: VideoConfig,
    pub paths: PathsConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            top_n: 5,
            keep_charts: false,
            parallel: false,
            universe: Universe::dax40(),
            selector: SelectorConfig::default(),
            data: DataConfig::default(),
            chart: ChartConfig::default(),
            video: VideoConfig::default(),
            paths: PathsConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.universe.validate()?;
        self.chart.resolve().validate()?;

        if self.selector.window_days == 0 {
            return Err(invalid("selector.window_days", "must be at least 1"));
        }
        if self.selector.lookback_calendar_days < 2 {
            return Err(invalid(
                "selector.lookback_calendar_days",
                "must cover at least 2 days",
            ));
        }
        if !(self.selector.epsilon.is_finite() && self.selector.epsilon >= 0.0) {
            return Err(invalid("selector.epsilon", "must be a non-negative number"));
        }
        if !(self.video.seconds_per_chart.is_finite() && self.video.seconds_per_chart > 0.0) {
            return Err(invalid("video.seconds_per_chart", "must be positive"));
        }
        for (field, seconds) in [
            ("video.intro_seconds", self.video.intro_seconds),
            ("video.outro_seconds", self.video.outro_seconds),
        ] {
            if !(seconds.is_finite() && seconds >= 0.0) {
                return Err(invalid(field, "must be zero or positive"));
            }
        }
        if self.video.fps == 0 {
            return Err(invalid("video.fps", "must be positive"));
        }
        if self.paths.video_prefix.is_empty() {
            return Err(invalid("paths.video_prefix", "must not be empty"));
        }
        if self.data.source == DataSourceKind::Csv && self.data.csv_dir.is_none() {
            return Err(invalid("data.csv_dir", "required when data.source = \"csv\""));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_is_default() {
        let config = PipelineConfig::from_toml("").unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.universe.len(), 40);
        assert_eq!(config.top_n, 5);
        assert_eq!(config.selector.window_days, 30);
    }

    #[test]
    fn default_round_trips_through_toml() {
        let config = PipelineConfig::default();
        let text = config.to_toml().unwrap();
        assert_eq!(PipelineConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn sections_override_individually() {
        let config = PipelineConfig::from_toml(
            r#"
top_n = 3
parallel = true

[universe]
name = "mini"
symbols = ["SAP.DE", "BMW.DE"]

[universe.names]
"SAP.DE" = "SAP"

[data]
source = "synthetic"
seed = 7

[chart]
preset = "plain"

[video]
seconds_per_chart = 2.5
audio = "music/loop.mp3"
"#,
        )
        .unwrap();

        assert_eq!(config.top_n, 3);
        assert!(config.parallel);
        assert_eq!(config.universe.symbols, ["SAP.DE", "BMW.DE"]);
        assert_eq!(config.universe.instrument("SAP.DE").display_name, "SAP");
        assert_eq!(config.data.source, DataSourceKind::Synthetic);
        assert_eq!(config.data.seed, 7);
        assert_eq!(config.chart.resolve(), ChartStyle::plain());
        assert_eq!(config.video.seconds_per_chart, 2.5);
        assert_eq!(config.video.fps, 24);
        assert_eq!(config.paths.video_prefix, "dax_top_movers");
    }

    #[test]
    fn explicit_style_replaces_preset() {
        let config = PipelineConfig::from_toml(
            "[chart]\npreset = \"plain\"\n[chart.style]\nline_width = 8\n",
        )
        .unwrap();
        let style = config.chart.resolve();
        assert_eq!(style.line_width, 8);
        assert_eq!(style.background, ChartStyle::dark().background);
    }

    #[test]
    fn rejects_non_portrait_style() {
        let err = PipelineConfig::from_toml("[chart.style]\nwidth = 1920\nheight = 1080\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Style(_)));
    }

    #[test]
    fn rejects_csv_source_without_dir() {
        let err = PipelineConfig::from_toml("[data]\nsource = \"csv\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "data.csv_dir", .. }));
    }

    #[test]
    fn rejects_duplicate_symbols() {
        let err = PipelineConfig::from_toml(
            "[universe]\nname = \"dup\"\nsymbols = [\"SAP.DE\", \"SAP.DE\"]\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Universe(_)));
    }

    #[test]
    fn rejects_zero_chart_duration() {
        let err = PipelineConfig::from_toml("[video]\nseconds_per_chart = 0.0\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "video.seconds_per_chart",
                ..
            }
        ));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = PipelineConfig::from_file(Path::new("/nonexistent/moverlab.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/moverlab.toml"));
    }
}
