//! Geographic/temporal occurrence-frequency data.

mod lookup;
mod store;

pub use lookup::{FrequencyLookup, FrequencyRecord};
pub use store::OfflineFrequencyStore;
