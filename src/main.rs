//! CLI: CSV in, PNG chart and/or JSON burst report out.
//!
//! Usage:
//!   burst-chart render data.csv -o graph.png
//!   burst-chart render data.csv --strategy slope-acceleration --json
//!   cat data.csv | burst-chart detect - --window 7 --z 2.5
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use burst_core::{
    detect, load, load_from_reader, logging, render_to_file, BurstSet, Config, DetectionConfig,
    LoadError, Series, Strategy,
};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "burst-chart", version, about = "Flag impression bursts and chart them")]
struct Cli {
    /// TOML config file; CLI flags override its values.
    #[arg(long, global = true, env = "BURST_CONFIG")]
    config: Option<PathBuf>,

    /// Log level when RUST_LOG is unset.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Detect bursts and write the chart image.
    Render {
        #[command(flatten)]
        detection: DetectionArgs,

        /// Output PNG path (overwritten).
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// TrueType font for chart text.
        #[arg(long)]
        font: Option<PathBuf>,

        /// Also print the burst report as JSON on stdout.
        #[arg(long)]
        json: bool,
    },
    /// Detect bursts and print them as JSON on stdout.
    Detect {
        #[command(flatten)]
        detection: DetectionArgs,
    },
}

#[derive(Debug, Args)]
struct DetectionArgs {
    /// CSV with `date` and `impressions` columns, or `-` for stdin.
    input: PathBuf,

    #[arg(long, value_enum)]
    strategy: Option<Strategy>,

    /// Rolling window size (rolling-zscore).
    #[arg(long)]
    window: Option<usize>,

    /// Standard deviations above the rolling mean (rolling-zscore).
    #[arg(long)]
    z: Option<f64>,

    /// Let the rolling window end at the candidate point (`=false` to turn off).
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    include_current: Option<bool>,

    /// Slope increase in impressions/minute (slope-acceleration).
    #[arg(long)]
    slope_threshold: Option<f64>,
}

impl DetectionArgs {
    fn apply(&self, config: &mut DetectionConfig) {
        if let Some(strategy) = self.strategy {
            config.strategy = strategy;
        }
        if let Some(window) = self.window {
            config.window_size = window;
        }
        if let Some(z) = self.z {
            config.z_multiplier = z;
        }
        if let Some(include_current) = self.include_current {
            config.include_current = include_current;
        }
        if let Some(threshold) = self.slope_threshold {
            config.slope_threshold = threshold;
        }
    }
}

#[derive(Debug, Serialize)]
struct DetectOutput<'a> {
    points: usize,
    #[serde(flatten)]
    result: &'a BurstSet,
}

fn read_series(input: &Path) -> Result<Series, LoadError> {
    if input == Path::new("-") {
        load_from_reader(io::stdin().lock())
    } else {
        load(input)
    }
}

fn print_json(series: &Series, bursts: &BurstSet) -> Result<(), serde_json::Error> {
    let output = DetectOutput {
        points: series.len(),
        result: bursts,
    };
    serde_json::to_writer_pretty(io::stdout(), &output)?;
    println!();
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(&cli.log_level);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("burst-chart: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> burst_core::Result<()> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    match cli.command {
        Command::Detect { detection } => {
            detection.apply(&mut config.detection);
            config.validate()?;

            let series = read_series(&detection.input)?;
            let bursts = detect(&series, &config.detection);
            print_json(&series, &bursts)?;
        }
        Command::Render {
            detection,
            output,
            font,
            json,
        } => {
            detection.apply(&mut config.detection);
            if let Some(output) = output {
                config.render.output = output;
            }
            if font.is_some() {
                config.render.font_path = font;
            }
            config.validate()?;

            let series = read_series(&detection.input)?;
            let bursts = detect(&series, &config.detection);
            render_to_file(&series, &bursts, &config.render, &config.render.output)?;
            info!(
                output = %config.render.output.display(),
                bursts = bursts.bursts.len(),
                "chart written"
            );
            if json {
                print_json(&series, &bursts)?;
            }
        }
    }
    Ok(())
}
