//! Taxonomy store: loads the taxonomy asset into an in-memory node arena.
//!
//! # Asset format
//!
//! Line-oriented CSV, header line skipped, one taxon per record:
//!
//! ```text
//! parent_taxon_id,taxon_id,rank_level,leaf_class_id,name
//! ,48460,100,,Life
//! 48460,1,70,,Animalia
//! 1,52747,10,0,Canis lupus
//! ```
//!
//! An empty `parent_taxon_id` marks a taxonomy-top record, attached to the
//! synthetic root. An empty `leaf_class_id` marks an internal node with no
//! trained class behind it.
//!
//! # Parent resolution policy
//!
//! Records with an empty parent id attach to the synthetic root silently.
//! Records whose parent id is not present anywhere in the asset also attach
//! to the root, with a warning: a single corrupt row should degrade the tree,
//! not abort classifier construction.

use crate::constants::{LIFE_NAME, LIFE_RANK_LEVEL, LIFE_TAXON_ID};
use crate::error::{Error, Result};
use crate::taxonomy::node::{NodeId, TaxonNode};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

/// Column positions in the taxonomy asset.
mod col {
    pub const PARENT_TAXON_ID: usize = 0;
    pub const TAXON_ID: usize = 1;
    pub const RANK_LEVEL: usize = 2;
    pub const LEAF_CLASS_ID: usize = 3;
    pub const NAME: usize = 4;
}

/// Immutable arena of taxon nodes with id and leaf-index lookup tables.
///
/// Built once at classifier construction time; read-only afterwards, so
/// sharing it across threads is safe.
#[derive(Debug)]
pub struct TaxonomyStore {
    nodes: Vec<TaxonNode>,
    root: NodeId,
    by_taxon_id: HashMap<String, NodeId>,
    /// Maps a model output index to its backing node. Holes are tolerated
    /// (skipped with a warning at classification time); the table length is
    /// the required model output vector length.
    by_leaf_index: Vec<Option<NodeId>>,
}

impl TaxonomyStore {
    /// Load a taxonomy from a CSV file on disk.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::TaxonomyFileNotFound {
                path: path.to_path_buf(),
            });
        }
        let file = std::fs::File::open(path)?;
        Self::from_reader(file).map_err(|e| match e {
            Error::TaxonomyRead { source, .. } => Error::TaxonomyRead {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    /// Load a taxonomy from any CSV reader (header line expected).
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        // Synthetic root goes in first so every orphan has somewhere to hang.
        let mut nodes = vec![TaxonNode {
            taxon_id: LIFE_TAXON_ID.to_string(),
            name: LIFE_NAME.to_string(),
            rank_level: LIFE_RANK_LEVEL,
            leaf_class_index: None,
            parent: None,
            children: Vec::new(),
        }];
        let root: NodeId = 0;
        let mut by_taxon_id = HashMap::new();
        by_taxon_id.insert(LIFE_TAXON_ID.to_string(), root);

        // First pass: materialize every record and index it by taxon id.
        // Parent attachment happens in a second pass because assets do not
        // guarantee parents appear before children.
        let mut parent_ids: Vec<String> = vec![String::new()];
        for result in csv_reader.records() {
            let record = result.map_err(|source| Error::TaxonomyRead {
                path: std::path::PathBuf::new(),
                source,
            })?;
            let line = record.position().map_or(0, csv::Position::line);

            if record.len() <= col::NAME {
                return Err(Error::MalformedRecord {
                    line,
                    message: format!("expected at least 5 fields, got {}", record.len()),
                });
            }
            let field = |index: usize| record.get(index).unwrap_or("").trim();

            let taxon_id = field(col::TAXON_ID);
            if taxon_id.is_empty() {
                return Err(Error::MalformedRecord {
                    line,
                    message: "taxon_id is empty".to_string(),
                });
            }
            let rank_level: f32 =
                field(col::RANK_LEVEL)
                    .parse()
                    .map_err(|_| Error::MalformedRecord {
                        line,
                        message: format!("rank_level '{}' is not numeric", field(col::RANK_LEVEL)),
                    })?;
            let leaf_class_id = field(col::LEAF_CLASS_ID);
            let leaf_class_index = if leaf_class_id.is_empty() {
                None
            } else {
                Some(
                    leaf_class_id
                        .parse::<usize>()
                        .map_err(|_| Error::MalformedRecord {
                            line,
                            message: format!(
                                "leaf_class_id '{leaf_class_id}' is not a non-negative integer"
                            ),
                        })?,
                )
            };

            // The asset may redundantly declare the root itself; keep the
            // synthetic instance and ignore the duplicate.
            if taxon_id == LIFE_TAXON_ID {
                continue;
            }

            let id = nodes.len();
            nodes.push(TaxonNode {
                taxon_id: taxon_id.to_string(),
                name: field(col::NAME).to_string(),
                rank_level,
                leaf_class_index,
                parent: None,
                children: Vec::new(),
            });
            parent_ids.push(field(col::PARENT_TAXON_ID).to_string());
            if by_taxon_id.insert(taxon_id.to_string(), id).is_some() {
                warn!("Duplicate taxon id '{taxon_id}' in taxonomy, keeping last");
            }
        }

        // Second pass: attach children to resolved parents.
        for id in 1..nodes.len() {
            let parent_id = &parent_ids[id];
            let parent = if parent_ids[id].is_empty() {
                root
            } else if let Some(&parent) = by_taxon_id.get(parent_id) {
                parent
            } else {
                warn!(
                    "Taxon '{}' references unknown parent '{}', attaching to root",
                    nodes[id].taxon_id, parent_id
                );
                root
            };
            nodes[id].parent = Some(parent);
            nodes[parent].children.push(id);
        }

        // Leaf-index lookup table. Holes are possible in a corrupt asset and
        // handled downstream; duplicates keep the first owner. The table
        // length, not the number of assigned slots, is the required model
        // output vector length.
        let max_index = nodes
            .iter()
            .filter_map(|n| n.leaf_class_index)
            .max()
            .map_or(0, |m| m + 1);
        let mut by_leaf_index: Vec<Option<NodeId>> = vec![None; max_index];
        for (id, node) in nodes.iter().enumerate() {
            if let Some(index) = node.leaf_class_index {
                if by_leaf_index[index].is_some() {
                    warn!(
                        "Duplicate leaf class index {} (taxon '{}'), keeping first",
                        index, node.taxon_id
                    );
                } else {
                    by_leaf_index[index] = Some(id);
                }
            }
        }
        debug!(
            "Loaded taxonomy: {} nodes, {} leaf classes",
            nodes.len(),
            by_leaf_index.len()
        );

        Ok(Self {
            nodes,
            root,
            by_taxon_id,
            by_leaf_index,
        })
    }

    /// The synthetic root node id.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Borrow a node by arena id.
    pub fn node(&self, id: NodeId) -> &TaxonNode {
        &self.nodes[id]
    }

    /// Look up a node by taxon id.
    pub fn by_taxon_id(&self, taxon_id: &str) -> Option<NodeId> {
        self.by_taxon_id.get(taxon_id).copied()
    }

    /// Look up the node backing a model output index, if any.
    pub fn by_leaf_index(&self, index: usize) -> Option<NodeId> {
        self.by_leaf_index.get(index).copied().flatten()
    }

    /// Required model output vector length.
    ///
    /// A score vector of any other length at classification time is a caller
    /// error (wrong model/taxonomy pair) and is rejected with
    /// [`Error::ShapeMismatch`].
    pub fn leaf_count(&self) -> usize {
        self.by_leaf_index.len()
    }

    /// Total number of nodes in the arena, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the arena holds only the synthetic root.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Pre-order traversal of the whole tree, root first.
    ///
    /// Iterative by design: taxonomy depth is normally small but not
    /// contractually bounded, so no recursion anywhere in the walks.
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            order.push(id);
            // Push in reverse so children come off the stack in insertion order.
            for &child in self.nodes[id].children.iter().rev() {
                stack.push(child);
            }
        }
        order
    }

    /// Taxon ids of the ancestors of `id`, oldest to newest, excluding the
    /// synthetic root and the node itself.
    pub fn ancestor_ids(&self, id: NodeId) -> Vec<String> {
        let mut ids = Vec::new();
        let mut current = self.nodes[id].parent;
        while let Some(ancestor) = current {
            if ancestor != self.root {
                ids.push(self.nodes[ancestor].taxon_id.clone());
            }
            current = self.nodes[ancestor].parent;
        }
        ids.reverse();
        ids
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SMALL_TAXONOMY: &str = "\
parent_taxon_id,taxon_id,rank_level,leaf_class_id,name
,1,70,,Animalia
1,2,40,,Carnivora
2,3,10,0,Canis lupus
2,4,10,1,Vulpes vulpes
,5,70,,Plantae
5,6,10,2,Quercus robur
";

    #[test]
    fn test_load_builds_tree_under_synthetic_root() {
        let store = TaxonomyStore::from_reader(SMALL_TAXONOMY.as_bytes()).unwrap();
        let root = store.root();
        assert_eq!(store.node(root).taxon_id, LIFE_TAXON_ID);
        assert_eq!(store.node(root).name, "Life");
        assert_eq!(store.node(root).children.len(), 2);
        assert_eq!(store.leaf_count(), 3);
        assert_eq!(store.len(), 7);
    }

    #[test]
    fn test_lookup_by_taxon_id_and_leaf_index() {
        let store = TaxonomyStore::from_reader(SMALL_TAXONOMY.as_bytes()).unwrap();
        let wolf = store.by_taxon_id("3").unwrap();
        assert_eq!(store.node(wolf).name, "Canis lupus");
        assert_eq!(store.node(wolf).leaf_class_index, Some(0));
        assert_eq!(store.by_leaf_index(0), Some(wolf));
        assert_eq!(store.by_leaf_index(99), None);
    }

    #[test]
    fn test_unknown_parent_attaches_to_root() {
        let csv = "\
parent_taxon_id,taxon_id,rank_level,leaf_class_id,name
999,3,10,0,Orphanus maximus
";
        let store = TaxonomyStore::from_reader(csv.as_bytes()).unwrap();
        let orphan = store.by_taxon_id("3").unwrap();
        assert_eq!(store.node(orphan).parent, Some(store.root()));
    }

    #[test]
    fn test_non_numeric_rank_is_malformed() {
        let csv = "\
parent_taxon_id,taxon_id,rank_level,leaf_class_id,name
,1,kingdom,,Animalia
";
        let err = TaxonomyStore::from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::MalformedRecord { .. }));
    }

    #[test]
    fn test_empty_taxon_id_is_malformed() {
        let csv = "\
parent_taxon_id,taxon_id,rank_level,leaf_class_id,name
,,70,,Animalia
";
        let err = TaxonomyStore::from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::MalformedRecord { .. }));
    }

    #[test]
    fn test_preorder_visits_parents_before_children() {
        let store = TaxonomyStore::from_reader(SMALL_TAXONOMY.as_bytes()).unwrap();
        let order = store.preorder();
        assert_eq!(order.len(), store.len());
        assert_eq!(order[0], store.root());
        let position: HashMap<NodeId, usize> =
            order.iter().enumerate().map(|(i, &id)| (id, i)).collect();
        for &id in &order {
            if let Some(parent) = store.node(id).parent {
                assert!(position[&parent] < position[&id]);
            }
        }
    }

    #[test]
    fn test_ancestor_ids_exclude_root_and_self() {
        let store = TaxonomyStore::from_reader(SMALL_TAXONOMY.as_bytes()).unwrap();
        let wolf = store.by_taxon_id("3").unwrap();
        assert_eq!(store.ancestor_ids(wolf), vec!["1".to_string(), "2".to_string()]);
        let kingdom = store.by_taxon_id("1").unwrap();
        assert!(store.ancestor_ids(kingdom).is_empty());
    }
}
