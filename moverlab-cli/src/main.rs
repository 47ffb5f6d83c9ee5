//! MoverLab CLI: daily movers video, mover listing, single charts.
//!
//! Commands:
//! - `run`: select movers, render charts, assemble the video
//! - `movers`: print (or export) the ranked gainers and losers
//! - `chart`: render one symbol's trailing chart
//! - `universe`: list the configured symbols and display names
//! - `config show`: print the effective configuration as TOML

use anyhow::{bail, Context, Result};
use chrono::{Days, Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use moverlab_core::chart::{ChartRenderer, ChartSpec, StylePreset};
use moverlab_core::data::{
    align_closes, CircuitBreaker, CsvProvider, DataProvider, SyntheticProvider, YahooProvider,
};
use moverlab_core::domain::{format_change, pct_change, MoverRecord};
use moverlab_core::{MoverSelection, MoverSelector};
use moverlab_runner::{
    DataSourceKind, FfmpegAssembler, Pipeline, PipelineConfig, RunOutcome, RunStatus,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "moverlab",
    about = "MoverLab CLI: daily top movers as portrait charts and video"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command that touches market data.
#[derive(Args)]
struct DataArgs {
    /// Path to a TOML config file. Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Last trading day to consider (YYYY-MM-DD). Defaults to yesterday.
    #[arg(long)]
    as_of: Option<String>,

    /// Read `<SYMBOL>.csv` files from this directory instead of Yahoo.
    #[arg(long, conflicts_with = "synthetic")]
    csv_dir: Option<PathBuf>,

    /// Use seeded synthetic prices (offline demo).
    #[arg(long, default_value_t = false)]
    synthetic: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Select movers, render their charts and assemble the video.
    Run {
        #[command(flatten)]
        data: DataArgs,

        /// Movers per side.
        #[arg(long)]
        top_n: Option<usize>,

        #[arg(long)]
        charts_dir: Option<PathBuf>,

        #[arg(long)]
        videos_dir: Option<PathBuf>,

        /// Background music file.
        #[arg(long)]
        audio: Option<PathBuf>,

        /// Stop after rendering; charts are kept.
        #[arg(long, default_value_t = false)]
        no_video: bool,

        /// Keep chart files after the video is written.
        #[arg(long, default_value_t = false)]
        keep_charts: bool,

        /// Render charts in parallel.
        #[arg(long, default_value_t = false)]
        parallel: bool,

        /// Write a daily log file into this directory.
        #[arg(long)]
        log_dir: Option<PathBuf>,
    },
    /// Print the ranked gainers and losers.
    Movers {
        #[command(flatten)]
        data: DataArgs,

        /// Movers per side.
        #[arg(long)]
        top_n: Option<usize>,

        /// Also write the ranking to this CSV file.
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Render the trailing chart of a single symbol.
    Chart {
        /// Symbol as known to the data source (e.g. SAP.DE).
        symbol: String,

        #[command(flatten)]
        data: DataArgs,

        /// Output directory. Defaults to the configured charts directory.
        #[arg(long)]
        out: Option<PathBuf>,

        /// Style preset: dark, plain, framed.
        #[arg(long)]
        style: Option<StylePreset>,
    },
    /// List the configured universe.
    Universe {
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Configuration commands.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration as TOML.
    Show {
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            data,
            top_n,
            charts_dir,
            videos_dir,
            audio,
            no_video,
            keep_charts,
            parallel,
            log_dir,
        } => {
            let mut config = load_config(data.config.as_deref())?;
            apply_data_args(&mut config, &data);
            if let Some(n) = top_n {
                config.top_n = n;
            }
            if let Some(dir) = charts_dir {
                config.paths.charts_dir = dir;
            }
            if let Some(dir) = videos_dir {
                config.paths.videos_dir = dir;
            }
            if let Some(path) = audio {
                config.video.audio = Some(path);
            }
            if log_dir.is_some() {
                config.paths.log_dir = log_dir;
            }
            if no_video {
                config.video.enabled = false;
            }
            config.keep_charts |= keep_charts;
            config.parallel |= parallel;
            config.validate()?;

            init_logging(config.paths.log_dir.as_deref())?;
            run_daily(&config, resolve_as_of(data.as_of.as_deref())?)
        }
        Commands::Movers { data, top_n, csv } => {
            let mut config = load_config(data.config.as_deref())?;
            apply_data_args(&mut config, &data);
            if let Some(n) = top_n {
                config.top_n = n;
            }
            config.validate()?;

            init_logging(None)?;
            run_movers(&config, resolve_as_of(data.as_of.as_deref())?, csv.as_deref())
        }
        Commands::Chart {
            symbol,
            data,
            out,
            style,
        } => {
            let mut config = load_config(data.config.as_deref())?;
            apply_data_args(&mut config, &data);
            if let Some(preset) = style {
                config.chart.preset = preset;
                config.chart.style = None;
            }
            if let Some(dir) = out {
                config.paths.charts_dir = dir;
            }
            config.validate()?;

            init_logging(None)?;
            run_chart(&config, &symbol, resolve_as_of(data.as_of.as_deref())?)
        }
        Commands::Universe { config } => {
            let config = load_config(config.as_deref())?;
            print_universe(&config);
            Ok(())
        }
        Commands::Config {
            action: ConfigAction::Show { config },
        } => {
            let config = load_config(config.as_deref())?;
            print!("{}", config.to_toml()?);
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(path) => PipelineConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(PipelineConfig::default()),
    }
}

fn apply_data_args(config: &mut PipelineConfig, data: &DataArgs) {
    if let Some(dir) = &data.csv_dir {
        config.data.source = DataSourceKind::Csv;
        config.data.csv_dir = Some(dir.clone());
    }
    if data.synthetic {
        config.data.source = DataSourceKind::Synthetic;
    }
}

fn resolve_as_of(raw: Option<&str>) -> Result<NaiveDate> {
    match raw {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .with_context(|| format!("invalid --as-of date '{s}' (expected YYYY-MM-DD)")),
        None => Local::now()
            .date_naive()
            .pred_opt()
            .context("cannot compute yesterday's date"),
    }
}

/// Console on stderr, plus a plain-text `daily_movers_<date>.log` when a
/// log directory is configured. `RUST_LOG` overrides the default `info`.
fn init_logging(log_dir: Option<&Path>) -> Result<()> {
    let file_layer = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating log directory {}", dir.display()))?;
            let path = dir.join(format!(
                "daily_movers_{}.log",
                Local::now().date_naive().format("%Y-%m-%d")
            ));
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("opening log file {}", path.display()))?;
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();
    Ok(())
}

fn build_provider(config: &PipelineConfig) -> Result<Box<dyn DataProvider>> {
    let provider: Box<dyn DataProvider> = match config.data.source {
        DataSourceKind::Yahoo => Box::new(YahooProvider::with_timeout(
            Arc::new(CircuitBreaker::default_provider()),
            Duration::from_secs(config.data.timeout_secs),
        )?),
        DataSourceKind::Csv => match &config.data.csv_dir {
            Some(dir) => Box::new(CsvProvider::new(dir)),
            None => bail!("data.source = \"csv\" needs data.csv_dir or --csv-dir"),
        },
        DataSourceKind::Synthetic => Box::new(SyntheticProvider::new(config.data.seed)),
    };
    Ok(provider)
}

fn build_renderer(config: &PipelineConfig) -> Result<ChartRenderer> {
    Ok(ChartRenderer::new(config.chart.resolve())?.with_window_days(config.selector.window_days))
}

fn run_daily(config: &PipelineConfig, as_of: NaiveDate) -> Result<()> {
    let provider = build_provider(config)?;
    let renderer = build_renderer(config)?;
    let assembler = FfmpegAssembler::new(config.video.ffmpeg.clone())
        .with_font_file(config.video.font_file.clone());
    let run_date = Local::now().date_naive();

    let mut pipeline = Pipeline::new(config, provider.as_ref(), &renderer);
    if config.video.enabled {
        pipeline = pipeline.with_assembler(&assembler);
    }
    let outcome = pipeline.run(as_of, run_date)?;
    print_outcome(&outcome, config.selector.epsilon);
    Ok(())
}

fn run_movers(config: &PipelineConfig, as_of: NaiveDate, csv_out: Option<&Path>) -> Result<()> {
    let provider = build_provider(config)?;
    let selector = MoverSelector::new(provider.as_ref(), config.selector.clone());
    let selection = selector.select_movers(&config.universe, config.top_n, as_of)?;

    print_selection(&selection, config.selector.epsilon);
    if let Some(path) = csv_out {
        write_movers_csv(&selection, path)?;
        println!("Ranking written to: {}", path.display());
    }
    Ok(())
}

fn run_chart(config: &PipelineConfig, symbol: &str, as_of: NaiveDate) -> Result<()> {
    let provider = build_provider(config)?;
    let start = as_of
        .checked_sub_days(Days::new(config.selector.lookback_calendar_days))
        .context("lookback reaches before the earliest representable date")?;
    let fetched = provider.fetch(symbol, start, as_of)?;
    let frame = align_closes(vec![(symbol.to_string(), fetched.bars)]);
    let series = match frame.series(symbol) {
        Some(series) if !series.is_empty() => series,
        _ => bail!("no closes for {symbol} between {start} and {as_of}"),
    };

    let window = series.trailing(config.selector.window_days);
    let change = match series.points() {
        [.., prior, last] => pct_change(prior.close, last.close),
        _ => 0.0,
    };
    let spec = ChartSpec {
        instrument: config.universe.instrument(symbol),
        window,
        pct_change: if change.is_finite() { change } else { 0.0 },
        rank_class: None,
    };

    let chart = build_renderer(config)?.render(&spec, &config.paths.charts_dir)?;
    info!(symbol, points = chart.points, "single chart rendered");
    println!("Chart written to: {}", chart.path.display());
    Ok(())
}

/// One CSV row per ranked mover.
#[derive(Serialize)]
struct MoverRow<'a> {
    rank_class: String,
    rank: usize,
    symbol: &'a str,
    name: &'a str,
    pct_change: f64,
}

fn write_movers_csv(selection: &MoverSelection, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    for list in [&selection.gainers, &selection.losers] {
        for (i, record) in list.iter().enumerate() {
            writer.serialize(MoverRow {
                rank_class: record.rank_class.to_string(),
                rank: i + 1,
                symbol: &record.instrument.symbol,
                name: &record.instrument.display_name,
                pct_change: record.pct_change,
            })?;
        }
    }
    writer.flush()?;
    Ok(())
}

fn print_movers(title: &str, records: &[MoverRecord], epsilon: f64) {
    println!("--- {title} ---");
    if records.is_empty() {
        println!("(none)");
    }
    for (i, record) in records.iter().enumerate() {
        println!(
            "{:>2}. {:<12} {:<28} {:>9}",
            i + 1,
            record.instrument.symbol,
            record.instrument.display_name,
            format_change(record.pct_change, epsilon)
        );
    }
}

fn print_selection(selection: &MoverSelection, epsilon: f64) {
    println!();
    match (selection.prior_date, selection.latest_date) {
        (Some(prior), Some(latest)) => println!("=== Movers {prior} → {latest} ==="),
        _ => println!("=== Movers ==="),
    }
    print_movers("Gainers", &selection.gainers, epsilon);
    println!();
    print_movers("Losers", &selection.losers, epsilon);
    if !selection.skipped.is_empty() {
        println!();
        println!("Skipped {} instrument(s):", selection.skipped.len());
        for missing in &selection.skipped {
            println!("  {}: {}", missing.symbol, missing.reason);
        }
    }
}

fn print_outcome(outcome: &RunOutcome, epsilon: f64) {
    print_selection(&outcome.selection, epsilon);
    println!();
    match &outcome.status {
        RunStatus::Completed { video } => println!("Video written to: {}", video.display()),
        RunStatus::ChartsOnly => {
            println!("Charts written ({}), video skipped:", outcome.charts.len());
            for chart in &outcome.charts {
                println!("  {}", chart.path.display());
            }
        }
        RunStatus::NoMovers => println!("No qualifying movers; nothing produced."),
    }
    if let Some(path) = &outcome.manifest_path {
        println!("Manifest: {}", path.display());
    }
}

fn print_universe(config: &PipelineConfig) {
    let universe = &config.universe;
    println!("Universe: {} ({} symbols)", universe.name, universe.len());
    println!("{:<12} {}", "Symbol", "Name");
    println!("{}", "-".repeat(40));
    for symbol in &universe.symbols {
        println!("{:<12} {}", symbol, universe.names.display_name(symbol));
    }
}
