//! Command-line parsing for the storm-events prediction tool.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the modeling/math code.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod prompt;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "stormcast", version, about = "Severe Weather Event Predictor (NOAA storm-events style)")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Train the event-type classifier and outcome regressor from a storm-events CSV.
    Train(TrainArgs),
    /// Predict event type and outcomes for a single query from saved models.
    Predict(PredictArgs),
    /// Prompt for month/day/hour/place and predict in a loop.
    ///
    /// This uses the same underlying models as `stormcast predict`, but resolves
    /// place names to coordinates via Nominatim geocoding.
    Interactive(InteractiveArgs),
    /// Generate a synthetic storm-events CSV for experimentation.
    Sample(SampleArgs),
}

/// Options for training.
#[derive(Debug, Parser, Clone)]
pub struct TrainArgs {
    /// Storm-events CSV to train from.
    #[arg(short = 'f', long)]
    pub csv: PathBuf,

    /// Directory where model artifacts are written.
    #[arg(short = 'm', long, default_value = "models")]
    pub model_dir: PathBuf,

    /// Random seed for the evaluation train/test splits.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Maximum number of skipped-row diagnostics to print.
    #[arg(long, default_value_t = 5)]
    pub max_row_errors: usize,
}

/// Options for a single scripted prediction.
#[derive(Debug, Parser, Clone)]
pub struct PredictArgs {
    /// Directory holding saved model artifacts.
    #[arg(short = 'm', long, default_value = "models")]
    pub model_dir: PathBuf,

    /// Month as a number (1-12) or a name (e.g. April, apr).
    #[arg(long)]
    pub month: String,

    /// Day of month.
    #[arg(long)]
    pub day: u32,

    /// Hour of day (0-23).
    #[arg(long)]
    pub hour: u32,

    /// Latitude in decimal degrees.
    #[arg(
        long,
        allow_hyphen_values = true,
        requires = "lon",
        conflicts_with = "place",
        required_unless_present = "place"
    )]
    pub lat: Option<f64>,

    /// Longitude in decimal degrees.
    #[arg(
        long,
        allow_hyphen_values = true,
        requires = "lat",
        required_unless_present = "place"
    )]
    pub lon: Option<f64>,

    /// Place name to geocode instead of giving --lat/--lon.
    #[arg(short = 'p', long)]
    pub place: Option<String>,
}

/// Options for the interactive prompt loop.
#[derive(Debug, Parser, Clone)]
pub struct InteractiveArgs {
    /// Directory holding saved model artifacts.
    #[arg(short = 'm', long, default_value = "models")]
    pub model_dir: PathBuf,
}

/// Options for synthetic sample generation.
#[derive(Debug, Parser, Clone)]
pub struct SampleArgs {
    /// Output CSV path.
    #[arg(short = 'o', long, default_value = "storm_sample.csv")]
    pub out: PathBuf,

    /// Number of rows to generate.
    #[arg(short = 'n', long, default_value_t = 500)]
    pub count: usize,

    /// Random seed for generation.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}
