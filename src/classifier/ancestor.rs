//! Common-ancestor resolution by threshold-gated descent.
//!
//! After aggregation, a greedy walk from the root finds the deepest node the
//! model is still confident about; everything outside that branch is then
//! zeroed in a second pass. Pruning by confidence walk rather than by a
//! per-node local threshold keeps a high-scoring deep node from being masked
//! by noise in unrelated branches.

use crate::classifier::aggregator::VisionScores;
use crate::taxonomy::{NodeId, TaxonomyStore};

/// Find the deepest node reachable from root by always following the
/// highest-scoring child whose score is at or above `threshold`.
///
/// Returns the root itself when no child qualifies at the first level.
pub fn find_common_ancestor(
    store: &TaxonomyStore,
    scores: &VisionScores,
    threshold: f32,
) -> NodeId {
    let mut current = store.root();
    loop {
        let best = store
            .node(current)
            .children
            .iter()
            .copied()
            .filter(|&child| scores.score(child) >= threshold)
            .max_by(|&a, &b| scores.score(a).total_cmp(&scores.score(b)));
        match best {
            Some(child) => current = child,
            None => return current,
        }
    }
}

/// Zero every sibling subtree along the path from `tip` back up to the root.
///
/// The branch itself is never touched, so scores along it (and the root's
/// grand total) survive for the blend and branch-building passes.
pub fn reset_outside_branch(store: &TaxonomyStore, scores: &mut VisionScores, tip: NodeId) {
    let mut current = tip;
    while let Some(parent) = store.node(current).parent {
        let siblings: Vec<NodeId> = store
            .node(parent)
            .children
            .iter()
            .copied()
            .filter(|&child| child != current)
            .collect();
        for sibling in siblings {
            zero_subtree(store, scores, sibling);
        }
        current = parent;
    }
}

/// Iteratively zero a whole subtree.
fn zero_subtree(store: &TaxonomyStore, scores: &mut VisionScores, top: NodeId) {
    let mut stack = vec![top];
    while let Some(id) = stack.pop() {
        scores.set(id, 0.0);
        stack.extend(store.node(id).children.iter().copied());
    }
}
