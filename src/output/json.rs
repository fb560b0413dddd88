//! JSON output format writer.

use crate::classifier::Prediction;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// JSON result file structure.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonResultFile {
    /// Source score vector file name.
    pub source_file: String,
    /// Classification timestamp.
    pub classified_at: DateTime<Utc>,
    /// Classification settings.
    pub settings: JsonSettings,
    /// The winning branch, root to leaf.
    pub predictions: Vec<JsonPrediction>,
    /// Summary statistics.
    pub summary: JsonSummary,
}

/// Classification settings for JSON output.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonSettings {
    /// Common-ancestor confidence threshold.
    pub ancestor_threshold: f32,
    /// Per-leaf score cutoff, if one was applied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score_threshold: Option<f32>,
    /// Filter taxon id, if a filter was applied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_taxon: Option<String>,
    /// Whether the filter was negated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_negated: Option<bool>,
    /// Latitude (if frequency blending).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    /// Longitude (if frequency blending).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
    /// Observation date (if frequency blending).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<chrono::NaiveDate>,
}

/// Single branch level in JSON format.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonPrediction {
    /// Taxon id.
    pub taxon_id: String,
    /// Display name.
    pub name: String,
    /// Numeric rank level.
    pub rank_level: f32,
    /// Human-readable rank name.
    pub rank: String,
    /// Final blended score.
    pub combined_score: f32,
    /// Vision component.
    pub vision_score: f32,
    /// Frequency component, when frequency data covered this taxon.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_score: Option<f32>,
    /// Ancestor taxon ids, oldest to newest, synthetic root excluded.
    pub ancestor_ids: Vec<String>,
}

impl From<&Prediction> for JsonPrediction {
    fn from(prediction: &Prediction) -> Self {
        Self {
            taxon_id: prediction.taxon_id.clone(),
            name: prediction.name.clone(),
            rank_level: prediction.rank_level,
            rank: prediction.rank_name.to_string(),
            combined_score: prediction.combined_score,
            vision_score: prediction.vision_score,
            frequency_score: prediction.frequency_score,
            ancestor_ids: prediction.ancestor_ids.clone(),
        }
    }
}

/// Summary statistics.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonSummary {
    /// Depth of the winning branch, root included.
    pub branch_depth: usize,
    /// Combined score of the finest prediction.
    pub top_score: f32,
}

/// Write a classified branch as a JSON result file.
pub fn write_json(
    path: &Path,
    source_file: &str,
    settings: JsonSettings,
    branch: &[Prediction],
) -> Result<()> {
    let result = JsonResultFile {
        source_file: source_file.to_string(),
        classified_at: Utc::now(),
        settings,
        predictions: branch.iter().map(JsonPrediction::from).collect(),
        summary: JsonSummary {
            branch_depth: branch.len(),
            top_score: branch.last().map_or(0.0, |p| p.combined_score),
        },
    };

    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, &result).map_err(|e| Error::JsonWrite {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    fn prediction(taxon_id: &str, rank_level: f32, score: f32) -> Prediction {
        Prediction {
            node: 0,
            taxon_id: taxon_id.to_string(),
            name: format!("Taxon {taxon_id}"),
            rank_level,
            rank_name: crate::taxonomy::rank::rank_name(rank_level),
            combined_score: score,
            vision_score: score,
            frequency_score: None,
            ancestor_ids: Vec::new(),
        }
    }

    fn settings() -> JsonSettings {
        JsonSettings {
            ancestor_threshold: 0.9,
            score_threshold: None,
            filter_taxon: None,
            filter_negated: None,
            lat: None,
            lon: None,
            date: None,
        }
    }

    #[test]
    fn test_write_json_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("result.taxa.json");
        let branch = vec![prediction("48460", 100.0, 0.9), prediction("1", 10.0, 0.9)];

        write_json(&path, "frame.scores", settings(), &branch).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let parsed: JsonResultFile = serde_json::from_str(&contents).unwrap();
        assert_eq!(parsed.source_file, "frame.scores");
        assert_eq!(parsed.predictions.len(), 2);
        assert_eq!(parsed.predictions[1].rank, "species");
        assert_eq!(parsed.summary.branch_depth, 2);
        assert_eq!(parsed.summary.top_score, 0.9);
    }

    #[test]
    fn test_optional_settings_omitted_when_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("result.taxa.json");
        write_json(&path, "frame.scores", settings(), &[]).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(!contents.contains("\"lat\""));
        assert!(!contents.contains("\"filter_taxon\""));
    }
}
