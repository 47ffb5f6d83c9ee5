//! Daily pipeline: selection, chart rendering and video assembly.
//!
//! select → render × N (gainers first, rank order) → assemble → manifest.
//! A selection failure aborts before anything is written. Render failures
//! are per chart; only zero charts aborts. Chart files are removed by a
//! scope guard armed before the first render, whatever the outcome.

use crate::cleanup::ChartCleanup;
use crate::config::PipelineConfig;
use crate::manifest::{ChartFailure, ManifestError, RunManifest, SCHEMA_VERSION};
use crate::video::{AssemblyError, AssemblyRequest, OverlayInfo, TitleCard, VideoAssembler};
use chrono::NaiveDate;
use moverlab_core::chart::{sanitize_symbol, ChartRenderer, ChartSpec, RenderError, RenderedChart};
use moverlab_core::data::DataProvider;
use moverlab_core::{MoverSelection, MoverSelector, SelectError};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("selection failed: {0}")]
    Select(#[from] SelectError),

    #[error("no chart could be rendered ({failed} failed)")]
    NoCharts { failed: usize },

    #[error("video assembly failed: {0}")]
    Assembly(#[from] AssemblyError),

    #[error("manifest error: {0}")]
    Manifest(#[from] ManifestError),
}

/// Anything that can turn a [`ChartSpec`] into a file.
pub trait ChartRender: Sync {
    fn render(&self, spec: &ChartSpec, output_dir: &Path) -> Result<RenderedChart, RenderError>;

    /// Canvas size handed to the video stage.
    fn dimensions(&self) -> (u32, u32);
}

impl ChartRender for ChartRenderer {
    fn render(&self, spec: &ChartSpec, output_dir: &Path) -> Result<RenderedChart, RenderError> {
        ChartRenderer::render(self, spec, output_dir)
    }

    fn dimensions(&self) -> (u32, u32) {
        (self.style().width, self.style().height)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunStatus {
    /// Video written.
    Completed { video: PathBuf },
    /// Charts rendered and kept; no video stage configured.
    ChartsOnly,
    /// Nothing qualified; no charts, no video.
    NoMovers,
}

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub status: RunStatus,
    pub selection: MoverSelection,
    pub charts: Vec<RenderedChart>,
    pub manifest: Option<RunManifest>,
    pub manifest_path: Option<PathBuf>,
}

pub struct Pipeline<'a> {
    config: &'a PipelineConfig,
    provider: &'a dyn DataProvider,
    renderer: &'a dyn ChartRender,
    assembler: Option<&'a dyn VideoAssembler>,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        config: &'a PipelineConfig,
        provider: &'a dyn DataProvider,
        renderer: &'a dyn ChartRender,
    ) -> Self {
        Self {
            config,
            provider,
            renderer,
            assembler: None,
        }
    }

    /// Without an assembler the run stops after rendering and keeps the charts.
    pub fn with_assembler(mut self, assembler: &'a dyn VideoAssembler) -> Self {
        self.assembler = Some(assembler);
        self
    }

    /// Select movers as of `as_of`, render them and assemble the video named
    /// after `run_date`.
    pub fn run(&self, as_of: NaiveDate, run_date: NaiveDate) -> Result<RunOutcome, RunError> {
        let config = self.config;
        info!(%as_of, %run_date, top_n = config.top_n, "daily run started");

        let selector = MoverSelector::new(self.provider, config.selector.clone());
        let selection = selector.select_movers(&config.universe, config.top_n, as_of)?;

        if selection.is_empty() {
            warn!("no qualifying movers; nothing to render");
            return Ok(RunOutcome {
                status: RunStatus::NoMovers,
                selection,
                charts: Vec::new(),
                manifest: None,
                manifest_path: None,
            });
        }

        // Armed before the first chart is written, so a panic mid-batch
        // still removes what was rendered.
        let mut cleanup = ChartCleanup::new(Vec::new(), config.keep_charts);
        let specs = selection.chart_specs();
        let (charts, failures) = self.render_all(&specs, &cleanup);
        if charts.is_empty() {
            error!(failed = failures.len(), "no charts rendered");
            return Err(RunError::NoCharts {
                failed: failures.len(),
            });
        }
        info!(
            rendered = charts.len(),
            failed = failures.len(),
            "charts rendered"
        );

        let (status, video) = match self.assembler {
            Some(assembler) => {
                let request = self.assembly_request(&selection, &charts, run_date);
                info!(assembler = assembler.name(), "video stage started");
                let video = assembler.assemble(&request)?;
                info!(video = %video.display(), "video written");
                (
                    RunStatus::Completed {
                        video: video.clone(),
                    },
                    Some(video),
                )
            }
            None => {
                cleanup.keep();
                (RunStatus::ChartsOnly, None)
            }
        };

        let manifest = RunManifest {
            schema_version: SCHEMA_VERSION,
            run_date,
            as_of,
            provider: self.provider.name().to_string(),
            universe: config.universe.name.clone(),
            top_n: config.top_n,
            prior_date: selection.prior_date,
            latest_date: selection.latest_date,
            dataset_hash: selection.dataset_hash.clone(),
            gainers: selection.gainers.clone(),
            losers: selection.losers.clone(),
            skipped: selection.skipped.clone(),
            charts: charts.clone(),
            chart_failures: failures,
            charts_kept: cleanup.is_kept(),
            video,
        };
        let manifest_path = config
            .paths
            .videos_dir
            .join(RunManifest::file_name(&config.paths.video_prefix, run_date));
        manifest.write(&manifest_path)?;
        info!(manifest = %manifest_path.display(), "run manifest written");

        Ok(RunOutcome {
            status,
            selection,
            charts,
            manifest: Some(manifest),
            manifest_path: Some(manifest_path),
        })
    }

    /// Render every spec, keeping input order in both result lists. Each
    /// written chart is handed to `cleanup` as soon as it exists.
    fn render_all(
        &self,
        specs: &[ChartSpec],
        cleanup: &ChartCleanup,
    ) -> (Vec<RenderedChart>, Vec<ChartFailure>) {
        let dir = self.config.paths.charts_dir.as_path();
        let renderer = self.renderer;
        let render = |spec: &ChartSpec| {
            let result = renderer.render(spec, dir);
            if let Ok(chart) = &result {
                cleanup.register(chart.path.clone());
            }
            result
        };
        let results: Vec<Result<RenderedChart, RenderError>> = if self.config.parallel {
            specs.par_iter().map(render).collect()
        } else {
            specs.iter().map(render).collect()
        };

        let mut charts = Vec::new();
        let mut failures = Vec::new();
        for (spec, result) in specs.iter().zip(results) {
            match result {
                Ok(chart) => charts.push(chart),
                Err(e) => {
                    warn!(symbol = %spec.instrument.symbol, error = %e, "chart failed");
                    failures.push(ChartFailure {
                        symbol: spec.instrument.symbol.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }
        (charts, failures)
    }

    fn assembly_request(
        &self,
        selection: &MoverSelection,
        charts: &[RenderedChart],
        run_date: NaiveDate,
    ) -> AssemblyRequest {
        let video = &self.config.video;
        let paths = &self.config.paths;

        let overlays: BTreeMap<String, OverlayInfo> = selection
            .movers()
            .map(|m| {
                (
                    sanitize_symbol(&m.instrument.symbol),
                    OverlayInfo {
                        pct_change: m.pct_change,
                        rank_class: Some(m.rank_class),
                    },
                )
            })
            .collect();
        if overlays.len() < selection.movers().count() {
            warn!("two movers share a chart file name; their overlays collide");
        }

        let card = |text: &str, seconds: f64| {
            (seconds > 0.0).then(|| TitleCard {
                text: text.replace("{date}", &run_date.format("%d.%m.%Y").to_string()),
                seconds,
            })
        };

        let (width, height) = self.renderer.dimensions();
        AssemblyRequest {
            images: charts.iter().map(|c| c.path.clone()).collect(),
            seconds_per_image: video.seconds_per_chart,
            overlays,
            audio: video.audio.clone(),
            output: paths.videos_dir.join(video_file_name(&paths.video_prefix, run_date)),
            intro: card(&video.intro_text, video.intro_seconds),
            outro: card(&video.outro_text, video.outro_seconds),
            width,
            height,
            fps: video.fps,
        }
    }
}

/// `<prefix>_<YYYY-MM-DD>.mp4`
pub fn video_file_name(prefix: &str, run_date: NaiveDate) -> String {
    format!("{prefix}_{}.mp4", run_date.format("%Y-%m-%d"))
}
