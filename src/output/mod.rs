//! Result writers and progress reporting.

mod csv;
mod json;
pub mod progress;

pub use csv::CsvWriter;
pub use json::{JsonPrediction, JsonResultFile, JsonSettings, JsonSummary, write_json};
