//! Frequency lookup capability trait.

use chrono::NaiveDate;

/// One taxon's observation count inside the queried window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequencyRecord {
    /// Current taxonomy id of the observed taxon.
    pub taxon_id: String,
    /// Number of observations aggregated over the window.
    pub count: u32,
}

/// Capability interface for geographic/temporal occurrence-frequency data.
///
/// The scoring core calls through this seam so it can be tested with fakes;
/// the shipped implementation is [`crate::frequency::OfflineFrequencyStore`].
pub trait FrequencyLookup {
    /// Observation counts for taxa seen around `(latitude, longitude)` in a
    /// window around `date`. Implementations define the exact window; the
    /// offline store uses a 3-month, 2x2 integer-degree-cell neighborhood.
    fn query(&self, date: NaiveDate, latitude: f64, longitude: f64) -> Vec<FrequencyRecord>;
}
