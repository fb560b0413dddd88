//! Best-branch construction from combined scores.

use crate::classifier::blender::CombinedScores;
use crate::taxonomy::{MappingTable, NodeId, TaxonomyStore, rank};

/// One level of the winning root-to-leaf path.
#[derive(Debug, Clone)]
pub struct Prediction {
    /// Arena id of the predicted node.
    pub node: NodeId,
    /// Taxon id of the predicted node.
    pub taxon_id: String,
    /// Display name.
    pub name: String,
    /// Numeric rank level.
    pub rank_level: f32,
    /// Human-readable rank name.
    pub rank_name: &'static str,
    /// Final blended score.
    pub combined_score: f32,
    /// Vision component of the score.
    pub vision_score: f32,
    /// Frequency component of the score, when frequency data covered it.
    pub frequency_score: Option<f32>,
    /// Taxon ids of the ancestors, oldest to newest, excluding the synthetic
    /// root.
    pub ancestor_ids: Vec<String>,
}

/// Walk from the root to a leaf, taking the highest-combined-score child at
/// each level.
///
/// Ties break to the earliest-inserted sibling (asset record order), which
/// keeps results reproducible for a given taxonomy file. The result always
/// starts at the root and ends at a childless node; its length is the depth
/// of the winning path. Taxon ids in the result are resolved through the
/// mapping, so remapped nodes report their current id.
pub fn build_best_branch(
    store: &TaxonomyStore,
    mapping: &MappingTable,
    scores: &CombinedScores,
) -> Vec<Prediction> {
    let mut branch = Vec::new();
    let mut current = store.root();
    branch.push(prediction_for(store, mapping, scores, current));

    loop {
        let best = store
            .node(current)
            .children
            .iter()
            .copied()
            .reduce(|best, child| {
                // Strictly greater replaces, equal keeps the earlier sibling.
                if scores.combined(child) > scores.combined(best) {
                    child
                } else {
                    best
                }
            });
        match best {
            Some(child) => {
                branch.push(prediction_for(store, mapping, scores, child));
                current = child;
            }
            None => return branch,
        }
    }
}

fn prediction_for(
    store: &TaxonomyStore,
    mapping: &MappingTable,
    scores: &CombinedScores,
    id: NodeId,
) -> Prediction {
    let node = store.node(id);
    Prediction {
        node: id,
        taxon_id: resolve_id(mapping, &node.taxon_id),
        name: node.name.clone(),
        rank_level: node.rank_level,
        rank_name: rank::rank_name(node.rank_level),
        combined_score: scores.combined(id),
        vision_score: scores.vision(id),
        frequency_score: scores.frequency(id),
        ancestor_ids: store
            .ancestor_ids(id)
            .into_iter()
            .map(|ancestor| resolve_id(mapping, &ancestor))
            .collect(),
    }
}

/// A node's current taxon id. Retired nodes keep their original id; they
/// score zero and cannot win a branch level, so the id only shows up in
/// diagnostics.
fn resolve_id(mapping: &MappingTable, taxon_id: &str) -> String {
    mapping
        .resolve(taxon_id)
        .surviving_id()
        .unwrap_or(taxon_id)
        .to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::classifier::aggregator::aggregate;
    use crate::classifier::blender::blend;
    use crate::taxonomy::{MappingTable, TaxonomyStore};

    const TAXONOMY: &str = "\
parent_taxon_id,taxon_id,rank_level,leaf_class_id,name
,1,70,,Animalia
1,2,40,,Carnivora
2,3,10,0,Canis lupus
2,4,10,1,Vulpes vulpes
1,5,40,,Rodentia
5,6,10,2,Mus musculus
";

    fn branch_for(scores: &[f32]) -> (TaxonomyStore, Vec<Prediction>) {
        let store = TaxonomyStore::from_reader(TAXONOMY.as_bytes()).unwrap();
        let mapping = MappingTable::empty();
        let vision = aggregate(&store, &mapping, scores, None, None).unwrap();
        let combined = blend(&store, &mapping, &vision, &[]);
        let branch = build_best_branch(&store, &mapping, &combined);
        (store, branch)
    }

    #[test]
    fn test_branch_follows_highest_scores() {
        let (_, branch) = branch_for(&[0.6, 0.2, 0.15]);
        let ids: Vec<&str> = branch.iter().map(|p| p.taxon_id.as_str()).collect();
        assert_eq!(ids, vec!["48460", "1", "2", "3"]);
        assert_eq!(branch[0].combined_score, 0.95);
        assert_eq!(branch[3].combined_score, 0.6);
    }

    #[test]
    fn test_branch_starts_at_root_ends_at_leaf_parent_linked() {
        let (store, branch) = branch_for(&[0.1, 0.4, 0.3]);
        assert_eq!(branch[0].node, store.root());
        assert!(store.node(branch.last().unwrap().node).is_leaf());
        for pair in branch.windows(2) {
            assert_eq!(store.node(pair[1].node).parent, Some(pair[0].node));
        }
    }

    #[test]
    fn test_ties_break_to_first_inserted_child() {
        let (_, branch) = branch_for(&[0.3, 0.1, 0.4]);
        // Carnivora and Rodentia both aggregate 0.4; Carnivora came first.
        assert_eq!(branch[2].taxon_id, "2");
    }

    #[test]
    fn test_remapped_winner_reports_current_ids() {
        let store = TaxonomyStore::from_reader(TAXONOMY.as_bytes()).unwrap();
        let mapping =
            MappingTable::from_reader("taxon_id,new_taxon_id\n3,300\n2,200\n".as_bytes()).unwrap();
        let vision = aggregate(&store, &mapping, &[0.6, 0.1, 0.1], None, None).unwrap();
        let combined = blend(&store, &mapping, &vision, &[]);
        let branch = build_best_branch(&store, &mapping, &combined);
        let species = branch.last().unwrap();
        assert_eq!(species.taxon_id, "300");
        assert_eq!(species.ancestor_ids, vec!["1".to_string(), "200".to_string()]);
    }

    #[test]
    fn test_predictions_carry_ancestors_and_rank_names() {
        let (_, branch) = branch_for(&[0.6, 0.2, 0.15]);
        let species = branch.last().unwrap();
        assert_eq!(species.rank_name, "species");
        assert_eq!(species.ancestor_ids, vec!["1".to_string(), "2".to_string()]);
        assert!(branch[0].ancestor_ids.is_empty());
    }
}
