//! Application-wide constants.
//!
//! All magic numbers and strings are defined here to ensure consistency
//! and make changes easy to track.

/// Application name used for config directories and user-facing messages.
pub const APP_NAME: &str = "taxascore";

/// Taxon id of the synthetic "Life" root node.
///
/// Taxonomy assets never declare this node; it is created at load time and
/// becomes the parent of every record with an empty parent id.
pub const LIFE_TAXON_ID: &str = "48460";

/// Display name of the synthetic root node.
pub const LIFE_NAME: &str = "Life";

/// Rank level of the synthetic root node.
pub const LIFE_RANK_LEVEL: f32 = 100.0;

/// Default confidence threshold for the common-ancestor descent.
pub const DEFAULT_ANCESTOR_THRESHOLD: f32 = 0.9;

/// Rank level boundaries.
pub mod rank_level {
    /// Subspecies rank level.
    pub const SUBSPECIES: f32 = 5.0;
    /// Species rank level.
    pub const SPECIES: f32 = 10.0;
    /// Genus rank level.
    pub const GENUS: f32 = 20.0;
    /// Family rank level.
    pub const FAMILY: f32 = 30.0;
    /// Order rank level.
    pub const ORDER: f32 = 40.0;
    /// Class rank level.
    pub const CLASS: f32 = 50.0;
    /// Phylum rank level.
    pub const PHYLUM: f32 = 60.0;
    /// Kingdom rank level.
    pub const KINGDOM: f32 = 70.0;
    /// Synthetic root rank level.
    pub const ROOT: f32 = 100.0;
}

/// Frequency blending constants.
pub mod blend {
    /// Weight applied to the frequency share of a taxon already supported by
    /// vision. Tuned so strong local priors can promote a candidate without
    /// fabricating certainty.
    pub const FREQUENCY_WEIGHT: f32 = 20.0;

    /// De-weighting factor for taxa seen only in the frequency data, never by
    /// vision. Keeps pure-frequency candidates below vision-supported ones in
    /// typical ranges.
    pub const FREQUENCY_ONLY_FACTOR: f32 = 0.75;

    /// Upper bound for a combined score.
    pub const MAX_COMBINED: f32 = 1.0;
}

/// Frequency store query constants.
pub mod frequency {
    /// Months included in the query window: previous, current, next.
    pub const WINDOW_MONTHS: usize = 3;
}

/// Temporal smoothing constants.
pub mod smoothing {
    /// Number of recent branches retained for backfilling.
    pub const HISTORY_SIZE: usize = 5;

    /// Default confidence a species-level prediction must reach to be
    /// considered an accepted result worth remembering.
    pub const DEFAULT_CONFIDENCE: f32 = 0.7;
}

/// Score value bounds.
pub mod score {
    /// Minimum valid score value.
    pub const MIN: f32 = 0.0;
    /// Maximum valid score value.
    pub const MAX: f32 = 1.0;
    /// Decimal places for score formatting.
    pub const DECIMAL_PLACES: usize = 4;
}

/// Output file extensions by format.
pub mod output_extensions {
    /// CSV output extension.
    pub const CSV: &str = ".taxa.csv";
    /// JSON output extension.
    pub const JSON: &str = ".taxa.json";
}
