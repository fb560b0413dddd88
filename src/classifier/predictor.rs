//! Top-level classifier facade wiring the scoring passes together.

use crate::classifier::aggregator::{TaxonFilter, aggregate};
use crate::classifier::ancestor::{find_common_ancestor, reset_outside_branch};
use crate::classifier::blender::{CombinedScores, blend};
use crate::classifier::branch::{Prediction, build_best_branch};
use crate::constants::DEFAULT_ANCESTOR_THRESHOLD;
use crate::error::Result;
use crate::frequency::{FrequencyLookup, FrequencyRecord};
use crate::taxonomy::{MappingTable, TaxonomyStore};
use chrono::NaiveDate;
use tracing::debug;

/// Where and when an observation happened, for frequency lookups.
#[derive(Debug, Clone, Copy)]
pub struct ObservationContext {
    /// Observation date.
    pub date: NaiveDate,
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
}

/// Per-call classification options.
#[derive(Debug, Clone, Default)]
pub struct ClassifyOptions {
    /// Optional identity filter restricting (or excluding) a subtree.
    pub filter: Option<TaxonFilter>,
    /// Optional per-leaf score cutoff applied during aggregation.
    pub score_threshold: Option<f32>,
    /// Confidence threshold for the common-ancestor descent. Defaults to
    /// [`DEFAULT_ANCESTOR_THRESHOLD`].
    pub ancestor_threshold: Option<f32>,
    /// Observation location/date; enables frequency blending when the
    /// classifier has a frequency source.
    pub context: Option<ObservationContext>,
}

/// Taxonomic classifier: immutable taxonomy and mapping plus an optional
/// frequency source.
///
/// Every `classify` call is a deterministic, side-effect-free computation;
/// the store and mapping are never mutated after construction, so a single
/// instance can serve concurrent callers.
pub struct TaxonClassifier {
    store: TaxonomyStore,
    mapping: MappingTable,
    frequency: Option<Box<dyn FrequencyLookup + Send + Sync>>,
}

impl TaxonClassifier {
    /// Build a classifier over a taxonomy with an identity mapping and no
    /// frequency source.
    pub fn new(store: TaxonomyStore) -> Self {
        Self {
            store,
            mapping: MappingTable::empty(),
            frequency: None,
        }
    }

    /// Replace the mapping table.
    pub fn with_mapping(mut self, mapping: MappingTable) -> Self {
        self.mapping = mapping;
        self
    }

    /// Attach a frequency source.
    pub fn with_frequency(
        mut self,
        frequency: Box<dyn FrequencyLookup + Send + Sync>,
    ) -> Self {
        self.frequency = Some(frequency);
        self
    }

    /// The loaded taxonomy.
    pub fn store(&self) -> &TaxonomyStore {
        &self.store
    }

    /// The active mapping table.
    pub fn mapping(&self) -> &MappingTable {
        &self.mapping
    }

    /// Expected score vector length.
    pub fn leaf_count(&self) -> usize {
        self.store.leaf_count()
    }

    /// Classify one score vector into the best-supported taxonomy path.
    ///
    /// Runs aggregation, the common-ancestor confidence prune, frequency
    /// blending (when a context and a frequency source are both present),
    /// and the best-branch walk.
    pub fn classify(&self, scores: &[f32], options: &ClassifyOptions) -> Result<Vec<Prediction>> {
        let combined = self.combined_scores(scores, options)?;
        Ok(build_best_branch(&self.store, &self.mapping, &combined))
    }

    /// The per-node combined scores behind [`Self::classify`], for callers
    /// that want more than the winning branch.
    pub fn combined_scores(
        &self,
        scores: &[f32],
        options: &ClassifyOptions,
    ) -> Result<CombinedScores> {
        let mut vision = aggregate(
            &self.store,
            &self.mapping,
            scores,
            options.filter.as_ref(),
            options.score_threshold,
        )?;

        let threshold = options
            .ancestor_threshold
            .unwrap_or(DEFAULT_ANCESTOR_THRESHOLD);
        let ancestor = find_common_ancestor(&self.store, &vision, threshold);
        reset_outside_branch(&self.store, &mut vision, ancestor);
        debug!(
            "Common ancestor: '{}' at rank level {}",
            self.store.node(ancestor).name,
            self.store.node(ancestor).rank_level
        );

        let records = self.frequency_records(options);
        Ok(blend(&self.store, &self.mapping, &vision, &records))
    }

    fn frequency_records(&self, options: &ClassifyOptions) -> Vec<FrequencyRecord> {
        match (self.frequency.as_ref(), options.context) {
            (Some(frequency), Some(context)) => {
                let records =
                    frequency.query(context.date, context.latitude, context.longitude);
                debug!(
                    "Frequency query at ({:.2}, {:.2}): {} taxa",
                    context.latitude,
                    context.longitude,
                    records.len()
                );
                records
            }
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::classifier::aggregator::TaxonFilter;

    const TAXONOMY: &str = "\
parent_taxon_id,taxon_id,rank_level,leaf_class_id,name
,1,70,,Animalia
1,2,10,0,Canis lupus
";

    struct FakeFrequency(Vec<FrequencyRecord>);

    impl FrequencyLookup for FakeFrequency {
        fn query(&self, _: NaiveDate, _: f64, _: f64) -> Vec<FrequencyRecord> {
            self.0.clone()
        }
    }

    fn classifier() -> TaxonClassifier {
        TaxonClassifier::new(TaxonomyStore::from_reader(TAXONOMY.as_bytes()).unwrap())
    }

    fn context() -> ObservationContext {
        ObservationContext {
            date: NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(),
            latitude: 62.0,
            longitude: 25.0,
        }
    }

    #[test]
    fn test_classify_single_species_scenario() {
        let branch = classifier()
            .classify(&[0.9], &ClassifyOptions::default())
            .unwrap();
        let names: Vec<&str> = branch.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Life", "Animalia", "Canis lupus"]);
        for prediction in &branch {
            assert_eq!(prediction.combined_score, 0.9);
        }
    }

    #[test]
    fn test_negative_filter_keeps_structure_with_zero_scores() {
        let options = ClassifyOptions {
            filter: Some(TaxonFilter {
                taxon_id: "2".to_string(),
                negate: true,
            }),
            ..ClassifyOptions::default()
        };
        let branch = classifier().classify(&[0.9], &options).unwrap();
        assert_eq!(branch.len(), 3);
        assert!(branch.iter().all(|p| p.combined_score == 0.0));
    }

    #[test]
    fn test_frequency_blending_applies_with_context() {
        let classifier = classifier().with_frequency(Box::new(FakeFrequency(vec![
            FrequencyRecord {
                taxon_id: "2".to_string(),
                count: 10,
            },
        ])));
        let options = ClassifyOptions {
            context: Some(context()),
            ..ClassifyOptions::default()
        };
        let branch = classifier.classify(&[0.5], &options).unwrap();
        let species = branch.last().unwrap();
        assert_eq!(species.combined_score, 1.0);
        assert_eq!(species.vision_score, 0.5);
        assert_eq!(species.frequency_score, Some(1.0));
    }

    #[test]
    fn test_no_context_skips_frequency() {
        let classifier = classifier().with_frequency(Box::new(FakeFrequency(vec![
            FrequencyRecord {
                taxon_id: "2".to_string(),
                count: 10,
            },
        ])));
        let branch = classifier
            .classify(&[0.5], &ClassifyOptions::default())
            .unwrap();
        assert_eq!(branch.last().unwrap().combined_score, 0.5);
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let err = classifier()
            .classify(&[0.5, 0.5], &ClassifyOptions::default())
            .unwrap_err();
        assert!(matches!(err, crate::error::Error::ShapeMismatch { .. }));
    }

    #[test]
    fn test_empty_taxonomy_empty_scores_yields_root_only() {
        let store = TaxonomyStore::from_reader(
            "parent_taxon_id,taxon_id,rank_level,leaf_class_id,name\n".as_bytes(),
        )
        .unwrap();
        let branch = TaxonClassifier::new(store)
            .classify(&[], &ClassifyOptions::default())
            .unwrap();
        assert_eq!(branch.len(), 1);
        assert_eq!(branch[0].name, "Life");
    }
}
