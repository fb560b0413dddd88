//! CLI argument definitions.

use crate::cli::validators::{parse_latitude, parse_longitude, parse_threshold};
use crate::config::OutputFormat;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Taxonomic inference and scoring for vision model outputs.
#[derive(Debug, Parser)]
#[command(name = "taxascore")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Score vector files to classify.
    pub inputs: Vec<PathBuf>,

    /// Common options for classification.
    #[command(flatten)]
    pub classify: ClassifyArgs,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage configuration.
    Config {
        /// Configuration action to perform.
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Inspect and verify taxonomy assets.
    Taxonomy {
        /// Taxonomy action to perform.
        #[command(subcommand)]
        action: TaxonomyAction,
    },
}

/// Config subcommand actions.
#[derive(Debug, Clone, Copy, Subcommand)]
pub enum ConfigAction {
    /// Create default configuration file.
    Init,
    /// Display current configuration.
    Show,
    /// Print configuration file path.
    Path,
}

/// Taxonomy subcommand actions.
#[derive(Debug, Clone, Copy, Subcommand)]
pub enum TaxonomyAction {
    /// Show node and leaf-class counts for the configured taxonomy.
    Info,
    /// Load the configured assets and report problems.
    Check,
}

/// Arguments for the classify command.
#[derive(Debug, Args)]
pub struct ClassifyArgs {
    /// Path to the taxonomy CSV (overrides config).
    #[arg(short, long, env = "TAXASCORE_TAXONOMY")]
    pub taxonomy: Option<PathBuf>,

    /// Path to the taxon mapping CSV (overrides config).
    #[arg(short, long, env = "TAXASCORE_MAPPING")]
    pub mapping: Option<PathBuf>,

    /// Path to the offline frequency store JSON (overrides config).
    #[arg(long, env = "TAXASCORE_FREQUENCY")]
    pub frequency: Option<PathBuf>,

    /// Observation latitude for frequency blending.
    #[arg(long, value_parser = parse_latitude, requires = "lon", requires = "date")]
    pub lat: Option<f64>,

    /// Observation longitude for frequency blending.
    #[arg(long, value_parser = parse_longitude, requires = "lat")]
    pub lon: Option<f64>,

    /// Observation date (YYYY-MM-DD) for frequency blending.
    #[arg(long, requires = "lat")]
    pub date: Option<NaiveDate>,

    /// Restrict results to the subtree under this taxon id.
    #[arg(long)]
    pub taxon: Option<String>,

    /// Invert the taxon filter: zero the subtree instead of keeping it.
    #[arg(long, requires = "taxon")]
    pub negate: bool,

    /// Per-leaf score cutoff (0.0-1.0) applied during aggregation.
    #[arg(short = 'c', long, value_parser = parse_threshold, env = "TAXASCORE_SCORE_THRESHOLD")]
    pub score_threshold: Option<f32>,

    /// Common-ancestor confidence threshold (0.0-1.0).
    #[arg(short = 'a', long, value_parser = parse_threshold, env = "TAXASCORE_ANCESTOR_THRESHOLD")]
    pub ancestor_threshold: Option<f32>,

    /// Treat the inputs as an ordered frame sequence and backfill weak
    /// species results from recent confident ones.
    #[arg(long)]
    pub smooth: bool,

    /// Output formats (comma-separated: json,csv).
    #[arg(short, long, value_delimiter = ',', env = "TAXASCORE_FORMAT")]
    pub format: Option<Vec<OutputFormat>>,

    /// Output directory (default: same as input).
    #[arg(short, long, env = "TAXASCORE_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Stop on first error.
    #[arg(long)]
    pub fail_fast: bool,

    /// Suppress progress output.
    #[arg(short, long)]
    pub quiet: bool,

    /// Disable the progress bar without reducing log output.
    #[arg(long)]
    pub no_progress: bool,

    /// Increase log verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}
