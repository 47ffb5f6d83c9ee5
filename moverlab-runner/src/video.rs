//! Video assembly: ordered chart images in, one MP4 out.
//!
//! The encoder is an external program behind [`VideoAssembler`]. The ffmpeg
//! implementation builds a single invocation: lavfi title cards, one looped
//! still per chart with drawtext overlays, a concat filter, and optional
//! background audio looped then cut to the video length.

use moverlab_core::chart::symbol_from_chart_path;
use moverlab_core::domain::{format_change, RankClass};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;
use tracing::{info, warn};

const OVERLAY_EPSILON: f64 = 1e-6;
const STDERR_TAIL_LINES: usize = 20;

#[derive(Debug, Error)]
pub enum AssemblyError {
    #[error("no images to assemble")]
    NoImages,

    #[error("cannot create video directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("encoder exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },

    #[error("encoder reported success but {0} was not written")]
    MissingOutput(PathBuf),
}

/// Per-chart overlay data, keyed by sanitized symbol in [`AssemblyRequest`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayInfo {
    pub pct_change: f64,
    pub rank_class: Option<RankClass>,
}

/// Full-screen text card shown before or after the charts.
#[derive(Debug, Clone, PartialEq)]
pub struct TitleCard {
    pub text: String,
    pub seconds: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssemblyRequest {
    /// Shown in exactly this order.
    pub images: Vec<PathBuf>,
    pub seconds_per_image: f64,
    pub overlays: BTreeMap<String, OverlayInfo>,
    pub audio: Option<PathBuf>,
    pub output: PathBuf,
    pub intro: Option<TitleCard>,
    pub outro: Option<TitleCard>,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl AssemblyRequest {
    pub fn total_seconds(&self) -> f64 {
        let cards: f64 = [&self.intro, &self.outro]
            .into_iter()
            .flatten()
            .map(|card| card.seconds)
            .sum();
        cards + self.seconds_per_image * self.images.len() as f64
    }
}

/// Turns an ordered list of images into one video file.
///
/// Implementations must not reorder `images`. A missing audio file is not an
/// error; the video is produced without sound.
pub trait VideoAssembler: Send + Sync {
    fn name(&self) -> &str;

    fn assemble(&self, request: &AssemblyRequest) -> Result<PathBuf, AssemblyError>;
}

pub struct FfmpegAssembler {
    program: PathBuf,
    font_file: Option<PathBuf>,
}

impl FfmpegAssembler {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            font_file: None,
        }
    }

    pub fn with_font_file(mut self, font_file: Option<PathBuf>) -> Self {
        self.font_file = font_file;
        self
    }

    /// Command-line arguments for one encode. `audio` must already be known
    /// to exist.
    pub fn build_args(&self, request: &AssemblyRequest, audio: Option<&Path>) -> Vec<String> {
        let fps = request.fps.to_string();
        let card_input = |card: &TitleCard| {
            vec![
                "-f".to_string(),
                "lavfi".to_string(),
                "-t".to_string(),
                seconds(card.seconds),
                "-i".to_string(),
                format!(
                    "color=c=black:s={}x{}:r={fps}",
                    request.width, request.height
                ),
            ]
        };

        let mut graph = FilterGraph::default();
        graph
            .args
            .extend(["-hide_banner", "-loglevel", "error", "-y"].map(String::from));

        if let Some(intro) = &request.intro {
            let text = self.drawtext(&intro.text, 80, "white", "(h-text_h)/2");
            graph.add_input(card_input(intro), format!("{text},setsar=1"));
        }

        for image in &request.images {
            let input = vec![
                "-loop".to_string(),
                "1".to_string(),
                "-framerate".to_string(),
                fps.clone(),
                "-t".to_string(),
                seconds(request.seconds_per_image),
                "-i".to_string(),
                image.display().to_string(),
            ];
            graph.add_input(input, self.image_chain(image, request));
        }

        if let Some(outro) = &request.outro {
            let text = self.drawtext(&outro.text, 70, "white", "(h-text_h)/2");
            graph.add_input(card_input(outro), format!("{text},setsar=1"));
        }

        let audio_input = audio.map(|audio| {
            graph.args.extend([
                "-stream_loop".to_string(),
                "-1".to_string(),
                "-i".to_string(),
                audio.display().to_string(),
            ]);
            graph.inputs
        });

        let mut args = graph.finish();
        if let Some(index) = audio_input {
            args.extend([
                "-map".to_string(),
                format!("{index}:a"),
                "-c:a".to_string(),
                "aac".to_string(),
            ]);
        }
        args.extend([
            "-c:v".to_string(),
            "libx264".to_string(),
            "-pix_fmt".to_string(),
            "yuv420p".to_string(),
            "-r".to_string(),
            fps,
            "-t".to_string(),
            seconds(request.total_seconds()),
            request.output.display().to_string(),
        ]);
        args
    }

    /// Scale/pad a chart to the canvas and burn in symbol and change.
    fn image_chain(&self, image: &Path, request: &AssemblyRequest) -> String {
        let mut chain = format!(
            "scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2,setsar=1",
            w = request.width,
            h = request.height,
        );
        let Some(symbol) = symbol_from_chart_path(image) else {
            return chain;
        };
        chain.push(',');
        chain.push_str(&self.drawtext(&symbol, 100, "white", "h*0.1"));
        if let Some(info) = request.overlays.get(&symbol) {
            let color = if info.pct_change > OVERLAY_EPSILON {
                "green"
            } else if info.pct_change < -OVERLAY_EPSILON {
                "red"
            } else {
                "white"
            };
            let change = format_change(info.pct_change, OVERLAY_EPSILON);
            chain.push(',');
            chain.push_str(&self.drawtext(&change, 80, color, "h*0.25"));
        }
        chain
    }

    fn drawtext(&self, text: &str, fontsize: u32, color: &str, y: &str) -> String {
        let font = self
            .font_file
            .as_ref()
            .map(|f| format!("fontfile='{}':", escape_text(&f.display().to_string())))
            .unwrap_or_default();
        format!(
            "drawtext={font}expansion=none:text='{}':fontsize={fontsize}:fontcolor={color}:\
             borderw=2:bordercolor=black:x=(w-text_w)/2:y={y}",
            escape_text(text)
        )
    }
}

impl VideoAssembler for FfmpegAssembler {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    fn assemble(&self, request: &AssemblyRequest) -> Result<PathBuf, AssemblyError> {
        if request.images.is_empty() {
            return Err(AssemblyError::NoImages);
        }
        if let Some(parent) = request.output.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| AssemblyError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let audio = request.audio.as_deref().filter(|path| {
            let exists = path.is_file();
            if !exists {
                warn!(audio = %path.display(), "audio file not found; video will be silent");
            }
            exists
        });

        let args = self.build_args(request, audio);
        info!(
            images = request.images.len(),
            seconds = request.total_seconds(),
            output = %request.output.display(),
            "assembling video"
        );

        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .map_err(|source| AssemblyError::Spawn {
                program: self.program.display().to_string(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let lines: Vec<&str> = stderr.lines().collect();
            let tail = lines[lines.len().saturating_sub(STDERR_TAIL_LINES)..].join("\n");
            return Err(AssemblyError::Failed {
                status: output.status.to_string(),
                stderr: tail,
            });
        }
        if !request.output.exists() {
            return Err(AssemblyError::MissingOutput(request.output.clone()));
        }
        Ok(request.output.clone())
    }
}

/// Inputs and per-input filter chains, joined by a final concat.
#[derive(Default)]
struct FilterGraph {
    args: Vec<String>,
    chains: Vec<String>,
    inputs: usize,
}

impl FilterGraph {
    fn add_input(&mut self, input_args: Vec<String>, chain: String) {
        let i = self.inputs;
        self.args.extend(input_args);
        self.chains.push(format!("[{i}:v]{chain},format=yuv420p[v{i}]"));
        self.inputs += 1;
    }

    fn finish(mut self) -> Vec<String> {
        let labels: String = (0..self.inputs).map(|i| format!("[v{i}]")).collect();
        let mut filter = self.chains.join(";");
        filter.push_str(&format!(";{labels}concat=n={}:v=1:a=0[outv]", self.inputs));
        self.args.extend([
            "-filter_complex".to_string(),
            filter,
            "-map".to_string(),
            "[outv]".to_string(),
        ]);
        self.args
    }
}

fn seconds(value: f64) -> String {
    format!("{value:.3}")
}

/// Escape text for a single-quoted drawtext option inside a filtergraph.
fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\'' => out.push('\u{2019}'),
            '\\' => out.push_str("\\\\"),
            ':' => out.push_str("\\:"),
            _ => out.push(c),
        }
    }
    out
}
