//! Configuration type definitions.

use crate::constants::DEFAULT_ANCESTOR_THRESHOLD;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Asset file locations.
    #[serde(default)]
    pub assets: AssetsConfig,

    /// Default settings.
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

/// Locations of the taxonomy, mapping, and frequency assets.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetsConfig {
    /// Path to the taxonomy CSV.
    pub taxonomy: Option<PathBuf>,

    /// Path to the taxon mapping CSV, if a mapping is in use.
    pub mapping: Option<PathBuf>,

    /// Path to the offline frequency store JSON, if one is available.
    pub frequency: Option<PathBuf>,
}

/// Default classification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    /// Confidence threshold for the common-ancestor descent.
    pub ancestor_threshold: f32,

    /// Per-leaf score cutoff; leaves below it are zeroed during aggregation.
    pub score_threshold: Option<f32>,

    /// Output formats.
    pub formats: Vec<OutputFormat>,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            ancestor_threshold: DEFAULT_ANCESTOR_THRESHOLD,
            score_threshold: None,
            formats: vec![OutputFormat::Json],
        }
    }
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JSON result file.
    Json,
    /// CSV result file.
    Csv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Csv => write!(f, "csv"),
        }
    }
}
