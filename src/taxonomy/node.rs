//! Taxon node arena types.

/// Index of a node inside a [`crate::taxonomy::TaxonomyStore`] arena.
///
/// Nodes reference each other by index rather than by owning pointers, so the
/// tree has a single owner and parent back-references cannot form cycles of
/// ownership.
pub type NodeId = usize;

/// A single taxon in the taxonomy tree.
#[derive(Debug, Clone)]
pub struct TaxonNode {
    /// Stable taxon identifier, unique across leaves and internal nodes.
    pub taxon_id: String,
    /// Display name.
    pub name: String,
    /// Numeric rank level (100 = root, 70 = kingdom, ... 10 = species,
    /// 5 = subspecies). Non-multiples of ten are sub/super ranks.
    pub rank_level: f32,
    /// Index into the model output vector, present only for nodes directly
    /// backed by a trained class.
    pub leaf_class_index: Option<usize>,
    /// Parent node, `None` only for the synthetic root.
    pub parent: Option<NodeId>,
    /// Children in asset insertion order. A node with no children is a leaf
    /// for aggregation purposes regardless of rank.
    pub children: Vec<NodeId>,
}

impl TaxonNode {
    /// Whether this node is a leaf for aggregation purposes.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Whether this node is at species rank or finer.
    pub fn is_species_or_finer(&self) -> bool {
        self.rank_level <= crate::constants::rank_level::SPECIES
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(rank_level: f32, children: Vec<NodeId>) -> TaxonNode {
        TaxonNode {
            taxon_id: "1".to_string(),
            name: "Test".to_string(),
            rank_level,
            leaf_class_index: None,
            parent: None,
            children,
        }
    }

    #[test]
    fn test_is_leaf() {
        assert!(node(10.0, vec![]).is_leaf());
        assert!(!node(10.0, vec![1]).is_leaf());
    }

    #[test]
    fn test_species_or_finer() {
        assert!(node(10.0, vec![]).is_species_or_finer());
        assert!(node(5.0, vec![]).is_species_or_finer());
        assert!(!node(20.0, vec![]).is_species_or_finer());
    }
}
