//! Offline occurrence-frequency store.
//!
//! # Asset format
//!
//! A single JSON document mapping an integer-degree grid cell key `"lat,lng"`
//! (e.g. `"62,25"`) to per-month observation lists:
//!
//! ```json
//! {
//!   "62,25": {
//!     "5": [ { "i": "12345", "c": 17 }, { "i": "67890", "c": 3 } ],
//!     "6": [ { "i": "12345", "c": 40 } ]
//!   }
//! }
//! ```
//!
//! `i` is the taxon id and `c` the observation count, matching the field
//! names of the upstream export.
//!
//! # Query semantics
//!
//! A query covers a 3-month window (month before, month itself, month after,
//! wrapping December to January) over the 2x2 grid-cell neighborhood whose
//! bottom-left cell is `floor(coord - 0.5)`. Latitude wraps 90 to -90 and
//! longitude 180 to -180 at the edges. Counts for the same taxon across cells
//! and months are summed, and the result is sorted by count descending.

use crate::constants::frequency::WINDOW_MONTHS;
use crate::error::{Error, Result};
use crate::frequency::lookup::{FrequencyLookup, FrequencyRecord};
use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// One observation entry in the asset.
#[derive(Debug, Deserialize)]
struct TaxonCount {
    /// Taxon id.
    #[serde(rename = "i")]
    taxon_id: String,
    /// Observation count.
    #[serde(rename = "c")]
    count: u32,
}

/// Per-cell data: month number (as a string key, "1".."12") to observations.
type MonthData = HashMap<String, Vec<TaxonCount>>;

/// Read-only frequency store backed by a JSON asset.
#[derive(Debug)]
pub struct OfflineFrequencyStore {
    cells: HashMap<String, MonthData>,
}

impl OfflineFrequencyStore {
    /// Load the store from a JSON file on disk.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::FrequencyRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let cells: HashMap<String, MonthData> =
            serde_json::from_str(&contents).map_err(|e| Error::FrequencyParse {
                path: path.to_path_buf(),
                source: e,
            })?;
        debug!("Loaded frequency store: {} grid cells", cells.len());
        Ok(Self { cells })
    }

    /// Build a store from already-parsed cell data. Test seam.
    #[cfg(test)]
    fn from_json(json: &str) -> Self {
        #[allow(clippy::unwrap_used)]
        Self {
            cells: serde_json::from_str(json).unwrap(),
        }
    }
}

/// The 2x2 grid cell keys around a coordinate, bottom-left first.
fn location_grid(latitude: f64, longitude: f64) -> [String; 4] {
    #[allow(clippy::cast_possible_truncation)]
    let lat = (latitude - 0.5).floor() as i32;
    #[allow(clippy::cast_possible_truncation)]
    let lng = (longitude - 0.5).floor() as i32;

    let next_lat = if lat == 90 { -90 } else { lat + 1 };
    let next_lng = if lng == 180 { -180 } else { lng + 1 };

    [
        format!("{next_lat},{lng}"),
        format!("{next_lat},{next_lng}"),
        format!("{lat},{lng}"),
        format!("{lat},{next_lng}"),
    ]
}

/// The 3-month window around a month, wrapping across year boundaries.
fn month_window(month: u32) -> [u32; WINDOW_MONTHS] {
    let prev = if month == 1 { 12 } else { month - 1 };
    let next = if month == 12 { 1 } else { month + 1 };
    [prev, month, next]
}

impl FrequencyLookup for OfflineFrequencyStore {
    fn query(&self, date: NaiveDate, latitude: f64, longitude: f64) -> Vec<FrequencyRecord> {
        let months = month_window(date.month());
        let mut counts: HashMap<&str, u32> = HashMap::new();

        for cell_key in location_grid(latitude, longitude) {
            let Some(cell) = self.cells.get(&cell_key) else {
                continue;
            };
            for month in months {
                let Some(observations) = cell.get(&month.to_string()) else {
                    continue;
                };
                for observation in observations {
                    *counts.entry(observation.taxon_id.as_str()).or_insert(0) +=
                        observation.count;
                }
            }
        }

        let mut records: Vec<FrequencyRecord> = counts
            .into_iter()
            .map(|(taxon_id, count)| FrequencyRecord {
                taxon_id: taxon_id.to_string(),
                count,
            })
            .collect();
        records.sort_by(|a, b| b.count.cmp(&a.count).then(a.taxon_id.cmp(&b.taxon_id)));
        records
    }
}
