//! Blending of vision scores with occurrence-frequency priors.
//!
//! Frequency evidence promotes taxa the vision model already supports and
//! can introduce (de-weighted) candidates vision never saw, but it can never
//! resurrect a taxon whose vision score was suppressed to zero.

use crate::classifier::aggregator::VisionScores;
use crate::constants::blend::{FREQUENCY_ONLY_FACTOR, FREQUENCY_WEIGHT, MAX_COMBINED};
use crate::frequency::FrequencyRecord;
use crate::taxonomy::{MappingTable, NodeId, Resolved, TaxonomyStore};
use std::collections::{HashMap, HashSet};

/// Per-node combined scores with the vision and frequency components kept
/// alongside for caller inspection.
#[derive(Debug, Clone)]
pub struct CombinedScores {
    combined: Vec<f32>,
    vision: Vec<f32>,
    frequency: Vec<Option<f32>>,
    /// Frequency-only taxa absent from the taxonomy entirely. They cannot
    /// take part in the branch walk but are surfaced for the caller.
    extras: Vec<(String, f32)>,
}

impl CombinedScores {
    /// Combined score of a node.
    pub fn combined(&self, id: NodeId) -> f32 {
        self.combined[id]
    }

    /// Vision component of a node.
    pub fn vision(&self, id: NodeId) -> f32 {
        self.vision[id]
    }

    /// Frequency component of a node, when frequency data covered it.
    pub fn frequency(&self, id: NodeId) -> Option<f32> {
        self.frequency[id]
    }

    /// Frequency-only candidates with no node in the taxonomy.
    pub fn extras(&self) -> &[(String, f32)] {
        &self.extras
    }

    /// Combined scores keyed by live taxon id, mirroring
    /// [`VisionScores::by_taxon`]: remapped nodes surface under their new id
    /// with merged scores accumulated, retired nodes surface as zero under
    /// their original id.
    pub fn by_taxon(&self, store: &TaxonomyStore, mapping: &MappingTable) -> HashMap<String, f32> {
        let mut map: HashMap<String, f32> = HashMap::new();
        for id in 0..self.combined.len() {
            let taxon_id = store.node(id).taxon_id.as_str();
            match mapping.resolve(taxon_id) {
                Resolved::Retired => {
                    map.entry(taxon_id.to_string()).or_insert(0.0);
                }
                Resolved::Unchanged(key) | Resolved::Remapped(key) => {
                    *map.entry(key.to_string()).or_insert(0.0) += self.combined[id];
                }
            }
        }
        map
    }
}

/// Blend aggregate vision scores with frequency records.
///
/// With no records (or an all-zero count sum) the vision scores pass through
/// unchanged. Frequency records are keyed by current taxonomy ids, so each
/// node is matched through its post-mapping id. Nodes sharing a resolved id
/// are one taxon for blending: the frequency boost and the cap apply once to
/// their merged vision total, never once per node.
pub fn blend(
    store: &TaxonomyStore,
    mapping: &MappingTable,
    vision: &VisionScores,
    records: &[FrequencyRecord],
) -> CombinedScores {
    let node_count = vision.len();
    let vision_scores: Vec<f32> = (0..node_count).map(|id| vision.score(id)).collect();

    let sum_count: u64 = records.iter().map(|r| u64::from(r.count)).sum();
    if records.is_empty() || sum_count == 0 {
        return CombinedScores {
            combined: vision_scores.clone(),
            vision: vision_scores,
            frequency: vec![None; node_count],
            extras: Vec::new(),
        };
    }

    let mut counts: HashMap<&str, u32> = HashMap::new();
    for record in records {
        *counts.entry(record.taxon_id.as_str()).or_insert(0) += record.count;
    }

    #[allow(clippy::cast_precision_loss)]
    let freq_share = |count: u32| count as f32 / sum_count as f32;

    // Nodes remapped to the same id count as one taxon, so the blend works
    // on merged vision totals keyed by resolved id.
    let resolved: Vec<Option<&str>> = (0..node_count)
        .map(|id| mapping.resolve(&store.node(id).taxon_id).surviving_id())
        .collect();
    let mut merged_vision: HashMap<&str, f32> = HashMap::new();
    for id in 0..node_count {
        if let Some(key) = resolved[id] {
            *merged_vision.entry(key).or_insert(0.0) += vision_scores[id];
        }
    }

    let mut matched: HashSet<&str> = HashSet::new();
    let mut scale: HashMap<&str, f32> = HashMap::new();
    for (&key, &count) in &counts {
        let Some(&taxon_vision) = merged_vision.get(key) else {
            continue;
        };
        matched.insert(key);
        // Zero vision stays zero: frequency cannot resurrect a taxon the
        // vision pass suppressed.
        if taxon_vision > 0.0 {
            let blended = freq_share(count)
                .mul_add(FREQUENCY_WEIGHT, taxon_vision)
                .min(MAX_COMBINED);
            scale.insert(key, blended / taxon_vision);
        }
    }

    // Scaling every member node by blended / merged_vision keeps the branch
    // walk ordering intact while the per-taxon sum lands exactly on the
    // blended value.
    let mut combined = vec![0.0f32; node_count];
    let mut frequency = vec![None; node_count];
    for id in 0..node_count {
        let factor = resolved[id]
            .and_then(|key| scale.get(key))
            .copied()
            .unwrap_or(1.0);
        combined[id] = vision_scores[id] * factor;
        frequency[id] = resolved[id]
            .and_then(|key| counts.get(key))
            .map(|&count| freq_share(count));
    }

    // Taxa seen only in the frequency data and absent from the taxonomy get a
    // capped, de-weighted synthetic score so they can surface without ever
    // outranking a vision-supported candidate in typical ranges.
    let mut extras: Vec<(String, f32)> = counts
        .iter()
        .filter(|(key, _)| !matched.contains(*key) && store.by_taxon_id(key).is_none())
        .map(|(key, &count)| ((*key).to_string(), freq_share(count) * FREQUENCY_ONLY_FACTOR))
        .collect();
    extras.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

    CombinedScores {
        combined,
        vision: vision_scores,
        frequency,
        extras,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::classifier::aggregator::aggregate;
    use crate::taxonomy::{MappingTable, TaxonomyStore};

    const TAXONOMY: &str = "\
parent_taxon_id,taxon_id,rank_level,leaf_class_id,name
,1,70,,Animalia
1,2,10,0,Canis lupus
1,3,10,1,Vulpes vulpes
";

    fn fixture() -> (TaxonomyStore, MappingTable, VisionScores) {
        let store = TaxonomyStore::from_reader(TAXONOMY.as_bytes()).unwrap();
        let mapping = MappingTable::empty();
        let vision = aggregate(&store, &mapping, &[0.5, 0.0], None, None).unwrap();
        (store, mapping, vision)
    }

    fn record(taxon_id: &str, count: u32) -> FrequencyRecord {
        FrequencyRecord {
            taxon_id: taxon_id.to_string(),
            count,
        }
    }

    #[test]
    fn test_no_records_is_pass_through() {
        let (store, mapping, vision) = fixture();
        let combined = blend(&store, &mapping, &vision, &[]);
        let wolf = store.by_taxon_id("2").unwrap();
        assert_eq!(combined.combined(wolf), 0.5);
        assert_eq!(combined.frequency(wolf), None);
        assert!(combined.extras().is_empty());
    }

    #[test]
    fn test_frequency_promotes_vision_supported_taxon_capped_at_one() {
        let (store, mapping, vision) = fixture();
        // sum_count = 10, wolf share = 1.0: 0.5 + 1.0 * 20 caps at 1.0.
        let combined = blend(&store, &mapping, &vision, &[record("2", 10)]);
        let wolf = store.by_taxon_id("2").unwrap();
        assert_eq!(combined.combined(wolf), 1.0);
        assert_eq!(combined.vision(wolf), 0.5);
        assert_eq!(combined.frequency(wolf), Some(1.0));
    }

    #[test]
    fn test_frequency_cannot_resurrect_zero_vision() {
        let (store, mapping, vision) = fixture();
        let combined = blend(&store, &mapping, &vision, &[record("3", 10)]);
        let fox = store.by_taxon_id("3").unwrap();
        assert_eq!(combined.combined(fox), 0.0);
        assert_eq!(combined.frequency(fox), Some(1.0));
    }

    #[test]
    fn test_small_share_blends_additively() {
        let (store, mapping, vision) = fixture();
        // Shares: wolf 1/100, other 99/100.
        let combined = blend(
            &store,
            &mapping,
            &vision,
            &[record("2", 1), record("999", 99)],
        );
        let wolf = store.by_taxon_id("2").unwrap();
        assert!((combined.combined(wolf) - (0.5 + 0.01 * 20.0)).abs() < 1e-6);
    }

    #[test]
    fn test_frequency_only_taxon_is_deweighted_extra() {
        let (store, mapping, vision) = fixture();
        let combined = blend(&store, &mapping, &vision, &[record("999", 10)]);
        assert_eq!(combined.extras().len(), 1);
        let (taxon_id, score) = &combined.extras()[0];
        assert_eq!(taxon_id, "999");
        assert_eq!(*score, 0.75);
    }

    #[test]
    fn test_remapped_node_matches_frequency_under_new_id() {
        let store = TaxonomyStore::from_reader(TAXONOMY.as_bytes()).unwrap();
        let mapping =
            MappingTable::from_reader("taxon_id,new_taxon_id\n2,200\n".as_bytes()).unwrap();
        let vision = aggregate(&store, &mapping, &[0.5, 0.0], None, None).unwrap();
        let combined = blend(&store, &mapping, &vision, &[record("200", 10)]);
        let wolf = store.by_taxon_id("2").unwrap();
        assert_eq!(combined.combined(wolf), 1.0);
        // Matched through the mapping, so not an extra.
        assert!(combined.extras().is_empty());
    }

    #[test]
    fn test_merged_taxon_gets_boost_once_and_stays_capped() {
        let store = TaxonomyStore::from_reader(TAXONOMY.as_bytes()).unwrap();
        let mapping =
            MappingTable::from_reader("taxon_id,new_taxon_id\n2,7\n3,7\n".as_bytes()).unwrap();
        let vision = aggregate(&store, &mapping, &[0.4, 0.4], None, None).unwrap();
        // Shares: merged taxon 1/100 (boost 0.2), the rest elsewhere.
        let combined = blend(
            &store,
            &mapping,
            &vision,
            &[record("7", 1), record("888", 99)],
        );
        // min(1.0, 0.8 + 0.2) over the merged vision total, not per node.
        let map = combined.by_taxon(&store, &mapping);
        assert!((map["7"] - 1.0).abs() < 1e-6);
        for score in map.values() {
            assert!((0.0..=1.0 + 1e-6).contains(score));
        }
    }

    #[test]
    fn test_all_outputs_stay_in_unit_interval() {
        let (store, mapping, vision) = fixture();
        let combined = blend(
            &store,
            &mapping,
            &vision,
            &[record("2", 50), record("3", 30), record("999", 20)],
        );
        for id in 0..store.len() {
            assert!(combined.combined(id) >= 0.0);
            assert!(combined.combined(id) <= 1.0);
        }
        for (_, score) in combined.extras() {
            assert!((0.0..=1.0).contains(score));
        }
    }
}
