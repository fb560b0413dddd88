//! Temporal smoothing of successive classification results.
//!
//! A caller classifying a stream of frames keeps one `PredictionHistory` and
//! offers each frame's branch to it; only branches carrying a confident
//! species-level result are retained. When a frame produces no confident
//! species-level result, the history backfills the most recent one so the
//! displayed identification does not flicker. This is presentation policy
//! layered on top of the scoring core; the per-call pipeline itself stays
//! stateless.

use crate::classifier::branch::Prediction;
use crate::constants::smoothing::{DEFAULT_CONFIDENCE, HISTORY_SIZE};
use std::collections::VecDeque;

/// Sliding window over the last few accepted prediction branches.
#[derive(Debug)]
pub struct PredictionHistory {
    branches: VecDeque<Vec<Prediction>>,
    capacity: usize,
    confidence: f32,
}

impl Default for PredictionHistory {
    fn default() -> Self {
        Self::new(HISTORY_SIZE, DEFAULT_CONFIDENCE)
    }
}

impl PredictionHistory {
    /// Create a history retaining `capacity` branches, backfilling species
    /// predictions at or above `confidence`.
    pub fn new(capacity: usize, confidence: f32) -> Self {
        Self {
            branches: VecDeque::with_capacity(capacity),
            capacity,
            confidence,
        }
    }

    /// Record a branch when it carries a confident species-or-finer
    /// prediction, evicting the oldest when the window is full. Weak
    /// branches are dropped so they never evict an accepted result.
    pub fn accept(&mut self, branch: &[Prediction]) {
        if !branch.iter().any(|p| self.qualifies(p)) {
            return;
        }
        if self.branches.len() == self.capacity {
            self.branches.pop_front();
        }
        self.branches.push_back(branch.to_vec());
    }

    /// Number of retained branches.
    pub fn len(&self) -> usize {
        self.branches.len()
    }

    /// Whether no branches are retained.
    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }

    /// Backfill a branch lacking a confident species-level result.
    ///
    /// When `branch` already holds a species-or-finer prediction at or above
    /// the confidence threshold it is returned unchanged. Otherwise the most
    /// recent qualifying prediction from history replaces the branch's
    /// species-rank slot (or is appended when the branch stops above species
    /// rank).
    pub fn backfill(&self, mut branch: Vec<Prediction>) -> Vec<Prediction> {
        if branch.iter().any(|p| self.qualifies(p)) {
            return branch;
        }
        let Some(substitute) = self
            .branches
            .iter()
            .rev()
            .find_map(|past| past.iter().find(|p| self.qualifies(p)).cloned())
        else {
            return branch;
        };

        match branch.iter().position(|p| is_species_or_finer(p)) {
            Some(slot) => {
                branch.truncate(slot);
                branch.push(substitute);
            }
            None => branch.push(substitute),
        }
        branch
    }

    fn qualifies(&self, prediction: &Prediction) -> bool {
        is_species_or_finer(prediction) && prediction.combined_score >= self.confidence
    }
}

fn is_species_or_finer(prediction: &Prediction) -> bool {
    prediction.rank_level <= crate::constants::rank_level::SPECIES
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    fn prediction(taxon_id: &str, rank_level: f32, combined_score: f32) -> Prediction {
        Prediction {
            node: 0,
            taxon_id: taxon_id.to_string(),
            name: taxon_id.to_string(),
            rank_level,
            rank_name: crate::taxonomy::rank::rank_name(rank_level),
            combined_score,
            vision_score: combined_score,
            frequency_score: None,
            ancestor_ids: Vec::new(),
        }
    }

    fn branch(species_id: &str, species_score: f32) -> Vec<Prediction> {
        vec![
            prediction("48460", 100.0, 0.95),
            prediction("1", 70.0, 0.9),
            prediction(species_id, 10.0, species_score),
        ]
    }

    #[test]
    fn test_confident_branch_passes_through() {
        let mut history = PredictionHistory::default();
        history.accept(&branch("3", 0.9));
        let current = branch("4", 0.8);
        let result = history.backfill(current);
        assert_eq!(result.last().unwrap().taxon_id, "4");
    }

    #[test]
    fn test_weak_species_backfilled_from_most_recent() {
        let mut history = PredictionHistory::default();
        history.accept(&branch("3", 0.9));
        history.accept(&branch("4", 0.85));
        let result = history.backfill(branch("5", 0.1));
        let last = result.last().unwrap();
        assert_eq!(last.taxon_id, "4");
        assert_eq!(last.combined_score, 0.85);
        assert_eq!(result.len(), 3);
    }

    #[test]
    fn test_branch_ending_above_species_gets_appended() {
        let mut history = PredictionHistory::default();
        history.accept(&branch("3", 0.9));
        let current = vec![prediction("48460", 100.0, 0.95), prediction("1", 70.0, 0.9)];
        let result = history.backfill(current);
        assert_eq!(result.len(), 3);
        assert_eq!(result.last().unwrap().taxon_id, "3");
    }

    #[test]
    fn test_no_history_leaves_branch_unchanged() {
        let history = PredictionHistory::default();
        let result = history.backfill(branch("5", 0.1));
        assert_eq!(result.last().unwrap().taxon_id, "5");
    }

    #[test]
    fn test_window_evicts_oldest_accepted() {
        let mut history = PredictionHistory::new(2, 0.7);
        history.accept(&branch("3", 0.9));
        history.accept(&branch("4", 0.8));
        history.accept(&branch("5", 0.85));
        assert_eq!(history.len(), 2);
        // "3" was evicted; the most recent accepted branch backfills.
        let result = history.backfill(branch("6", 0.1));
        assert_eq!(result.last().unwrap().taxon_id, "5");
    }

    #[test]
    fn test_weak_frames_are_not_recorded() {
        let mut history = PredictionHistory::new(2, 0.7);
        history.accept(&branch("3", 0.9));
        for _ in 0..5 {
            history.accept(&branch("4", 0.2));
        }
        assert_eq!(history.len(), 1);
        // A long weak run cannot flush the accepted result.
        let result = history.backfill(branch("5", 0.1));
        assert_eq!(result.last().unwrap().taxon_id, "3");
    }
}
