//! Taxonomic scoring core: aggregation, pruning, blending, branch building.

mod aggregator;
mod ancestor;
mod blender;
mod branch;
mod predictor;
mod smoothing;

pub use aggregator::{TaxonFilter, VisionScores, aggregate};
pub use ancestor::{find_common_ancestor, reset_outside_branch};
pub use blender::{CombinedScores, blend};
pub use branch::{Prediction, build_best_branch};
pub use predictor::{ClassifyOptions, ObservationContext, TaxonClassifier};
pub use smoothing::PredictionHistory;
