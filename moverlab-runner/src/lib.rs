//! MoverLab Runner: the daily run built on `moverlab-core`.
//!
//! - TOML pipeline configuration with per-section defaults
//! - Chart batch (sequential or on the rayon pool), order preserved
//! - Video assembly through an external encoder
//! - Chart cleanup guard and a JSON run manifest

pub mod cleanup;
pub mod config;
pub mod manifest;
pub mod pipeline;
pub mod video;

pub use cleanup::ChartCleanup;
pub use config::{
    ChartConfig, ConfigError, DataConfig, DataSourceKind, PathsConfig, PipelineConfig,
    VideoConfig,
};
pub use manifest::{ChartFailure, ManifestError, RunManifest, SCHEMA_VERSION};
pub use pipeline::{
    video_file_name, ChartRender, Pipeline, RunError, RunOutcome, RunStatus,
};
pub use video::{
    AssemblyError, AssemblyRequest, FfmpegAssembler, OverlayInfo, TitleCard, VideoAssembler,
};
