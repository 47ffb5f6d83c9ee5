//! Run manifest: a JSON record of what one run selected and produced.

use chrono::NaiveDate;
use moverlab_core::chart::RenderedChart;
use moverlab_core::domain::MoverRecord;
use moverlab_core::InstrumentDataMissing;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Current schema version for persisted manifests.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("manifest I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("manifest JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A chart that could not be rendered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartFailure {
    pub symbol: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_date: NaiveDate,
    pub as_of: NaiveDate,
    pub provider: String,
    pub universe: String,
    pub top_n: usize,
    pub prior_date: Option<NaiveDate>,
    pub latest_date: Option<NaiveDate>,
    pub dataset_hash: Option<String>,
    pub gainers: Vec<MoverRecord>,
    pub losers: Vec<MoverRecord>,
    pub skipped: Vec<InstrumentDataMissing>,
    pub charts: Vec<RenderedChart>,
    pub chart_failures: Vec<ChartFailure>,
    /// False when the chart files were deleted after assembly.
    pub charts_kept: bool,
    pub video: Option<PathBuf>,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl RunManifest {
    /// `<prefix>_<YYYY-MM-DD>.json`, next to the video of the same run.
    pub fn file_name(prefix: &str, run_date: NaiveDate) -> String {
        format!("{prefix}_{}.json", run_date.format("%Y-%m-%d"))
    }

    pub fn write(&self, path: &Path) -> Result<(), ManifestError> {
        let io_err = |source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(io_err)
    }

    pub fn read(path: &Path) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }
}
