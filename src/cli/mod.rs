//! CLI argument parsing and command handling.

mod args;
pub mod validators;

pub use args::{Cli, ClassifyArgs, Command, ConfigAction, TaxonomyAction};
