//! Taxonomy tree, id mapping, and rank naming.

mod mapping;
mod node;
pub mod rank;
mod store;

pub use mapping::{MappingTable, Resolved};
pub use node::{NodeId, TaxonNode};
pub use store::TaxonomyStore;
