//! Bottom-up score aggregation over the taxonomy tree.
//!
//! Turns the model's per-leaf probabilities into a per-node aggregate score:
//! a leaf scores its own model output (after mapping, filter, and threshold
//! resets), an internal node scores the sum of its children. The root ("Life")
//! ends up with the grand total, so no probability mass is created or lost on
//! the way up.

use crate::error::{Error, Result};
use crate::taxonomy::{MappingTable, NodeId, Resolved, TaxonomyStore};
use std::collections::HashMap;
use tracing::warn;

/// Taxon identity filter applied during aggregation.
///
/// A positive filter keeps only the subtree under `taxon_id`; a negative
/// filter zeroes exactly that subtree and keeps everything else.
#[derive(Debug, Clone)]
pub struct TaxonFilter {
    /// Taxon id the filter pivots on.
    pub taxon_id: String,
    /// When true, zero the subtree instead of keeping it.
    pub negate: bool,
}

/// Per-node aggregate vision scores for one classification call.
#[derive(Debug, Clone)]
pub struct VisionScores {
    per_node: Vec<f32>,
}

impl VisionScores {
    /// Aggregate score of a node.
    pub fn score(&self, id: NodeId) -> f32 {
        self.per_node[id]
    }

    /// Overwrite a node's score. Used by the outside-branch reset pass.
    pub(crate) fn set(&mut self, id: NodeId, value: f32) {
        self.per_node[id] = value;
    }

    /// Number of scored nodes (equals the arena size).
    pub fn len(&self) -> usize {
        self.per_node.len()
    }

    /// Whether there are no scored nodes.
    pub fn is_empty(&self) -> bool {
        self.per_node.is_empty()
    }

    /// Scores keyed by live taxon id, the external contract of aggregation.
    ///
    /// Remapped nodes surface under their new id; when several nodes resolve
    /// to the same id their scores accumulate (taxon-merge handling). Retired
    /// nodes surface as zero under their original id.
    pub fn by_taxon(&self, store: &TaxonomyStore, mapping: &MappingTable) -> HashMap<String, f32> {
        let mut map: HashMap<String, f32> = HashMap::new();
        for id in 0..self.per_node.len() {
            let taxon_id = store.node(id).taxon_id.as_str();
            match mapping.resolve(taxon_id) {
                Resolved::Retired => {
                    map.entry(taxon_id.to_string()).or_insert(0.0);
                }
                Resolved::Unchanged(key) | Resolved::Remapped(key) => {
                    *map.entry(key.to_string()).or_insert(0.0) += self.per_node[id];
                }
            }
        }
        map
    }
}

/// Aggregate per-leaf model scores into per-node scores.
///
/// `scores` must have exactly `store.leaf_count()` entries; anything else is a
/// mismatched model/taxonomy asset pair and fails fast with
/// [`Error::ShapeMismatch`]. The walk is an explicit reverse pre-order, never
/// recursion, since taxonomy depth is not contractually bounded.
pub fn aggregate(
    store: &TaxonomyStore,
    mapping: &MappingTable,
    scores: &[f32],
    filter: Option<&TaxonFilter>,
    threshold: Option<f32>,
) -> Result<VisionScores> {
    if scores.len() != store.leaf_count() {
        return Err(Error::ShapeMismatch {
            got: scores.len(),
            expected: store.leaf_count(),
        });
    }
    for index in 0..scores.len() {
        if store.by_leaf_index(index).is_none() {
            warn!("Model output index {index} has no taxon node, skipping");
        }
    }

    let order = store.preorder();

    // Filter containment descends with the pre-order walk: a node is inside
    // the filter subtree when it or any ancestor carries the filter id.
    let in_subtree = filter.map(|f| {
        let mut inside = vec![false; store.len()];
        for &id in &order {
            let node = store.node(id);
            inside[id] = node.taxon_id == f.taxon_id
                || node.parent.is_some_and(|p| inside[p]);
        }
        inside
    });

    // Reverse pre-order visits every child before its parent.
    let mut per_node = vec![0.0f32; store.len()];
    for &id in order.iter().rev() {
        let node = store.node(id);

        if matches!(mapping.resolve(&node.taxon_id), Resolved::Retired) {
            per_node[id] = 0.0;
            continue;
        }

        per_node[id] = if node.is_leaf() {
            let mut score = node
                .leaf_class_index
                .map_or(0.0, |index| scores.get(index).copied().unwrap_or(0.0));
            let mut reset = false;
            if let (Some(f), Some(inside)) = (filter, in_subtree.as_ref()) {
                if (inside[id] && f.negate) || (!inside[id] && !f.negate) {
                    score = 0.0;
                    reset = true;
                }
            }
            if let Some(cutoff) = threshold {
                if !reset && score < cutoff {
                    score = 0.0;
                }
            }
            score
        } else {
            node.children.iter().map(|&child| per_node[child]).sum()
        };
    }

    Ok(VisionScores { per_node })
}
