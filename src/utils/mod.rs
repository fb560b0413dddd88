//! Shared utilities.

pub mod score_vector;
