//! Taxon id mapping table for taxonomies that evolved since model training.
//!
//! Taxa get merged, split, or retired between the time a model is trained and
//! the time it runs. The mapping asset is a CSV of `taxon_id,new_taxon_id`
//! pairs, header line skipped; an empty `new_taxon_id` marks a retired taxon
//! whose score must never surface.

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Outcome of resolving a taxon id through the mapping table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolved<'a> {
    /// No mapping entry; the id is current.
    Unchanged(&'a str),
    /// The taxon was merged into another; use the new id.
    Remapped(&'a str),
    /// The taxon was retired; its score is zeroed and keyed under the
    /// original id.
    Retired,
}

impl<'a> Resolved<'a> {
    /// The id this resolution surfaces under, or `None` when retired.
    pub fn surviving_id(self) -> Option<&'a str> {
        match self {
            Self::Unchanged(id) | Self::Remapped(id) => Some(id),
            Self::Retired => None,
        }
    }
}

/// Immutable old-id to new-id (or tombstone) rewrite table.
///
/// An empty table resolves every id as [`Resolved::Unchanged`], which is also
/// the behavior when no mapping asset is configured.
#[derive(Debug, Default)]
pub struct MappingTable {
    entries: HashMap<String, Option<String>>,
}

impl MappingTable {
    /// Build an identity mapping (no asset supplied).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load a mapping table from a CSV file on disk.
    pub fn load(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file).map_err(|e| match e {
            Error::MappingRead { source, .. } => Error::MappingRead {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    /// Load a mapping table from any CSV reader (header line expected).
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut entries = HashMap::new();
        for result in csv_reader.records() {
            let record = result.map_err(|source| Error::MappingRead {
                path: std::path::PathBuf::new(),
                source,
            })?;
            let line = record.position().map_or(0, csv::Position::line);

            let old_id = record.get(0).unwrap_or("").trim();
            if old_id.is_empty() {
                return Err(Error::MalformedRecord {
                    line,
                    message: "taxon_id is empty".to_string(),
                });
            }
            let new_id = record.get(1).unwrap_or("").trim();
            entries.insert(
                old_id.to_string(),
                if new_id.is_empty() {
                    None
                } else {
                    Some(new_id.to_string())
                },
            );
        }

        debug!("Loaded mapping table: {} entries", entries.len());
        Ok(Self { entries })
    }

    /// Resolve a taxon id through the table.
    pub fn resolve<'a>(&'a self, taxon_id: &'a str) -> Resolved<'a> {
        match self.entries.get(taxon_id) {
            None => Resolved::Unchanged(taxon_id),
            Some(Some(new_id)) => Resolved::Remapped(new_id),
            Some(None) => Resolved::Retired,
        }
    }

    /// Number of mapping entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const MAPPING: &str = "\
taxon_id,new_taxon_id
100,200
101,
";

    #[test]
    fn test_resolve_remapped() {
        let table = MappingTable::from_reader(MAPPING.as_bytes()).unwrap();
        assert_eq!(table.resolve("100"), Resolved::Remapped("200"));
    }

    #[test]
    fn test_resolve_retired() {
        let table = MappingTable::from_reader(MAPPING.as_bytes()).unwrap();
        assert_eq!(table.resolve("101"), Resolved::Retired);
        assert_eq!(table.resolve("101").surviving_id(), None);
    }

    #[test]
    fn test_resolve_absent_is_unchanged() {
        let table = MappingTable::from_reader(MAPPING.as_bytes()).unwrap();
        assert_eq!(table.resolve("999"), Resolved::Unchanged("999"));
    }

    #[test]
    fn test_empty_table_is_identity() {
        let table = MappingTable::empty();
        assert_eq!(table.resolve("100"), Resolved::Unchanged("100"));
        assert!(table.is_empty());
    }

    #[test]
    fn test_empty_old_id_is_malformed() {
        let csv = "taxon_id,new_taxon_id\n,200\n";
        let err = MappingTable::from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::MalformedRecord { .. }));
    }
}
