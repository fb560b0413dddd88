//! Rank level to rank name formatting.
//!
//! A plain lookup table passed by reference where needed; no process-wide
//! mutable state.

use crate::constants::rank_level;

/// Primary Linnaean rank names by level. Levels between entries are
/// sub/super ranks and fall back to the next coarser primary name.
const PRIMARY_RANKS: &[(f32, &str)] = &[
    (rank_level::SUBSPECIES, "subspecies"),
    (rank_level::SPECIES, "species"),
    (rank_level::GENUS, "genus"),
    (rank_level::FAMILY, "family"),
    (rank_level::ORDER, "order"),
    (rank_level::CLASS, "class"),
    (rank_level::PHYLUM, "phylum"),
    (rank_level::KINGDOM, "kingdom"),
    (rank_level::ROOT, "stateofmatter"),
];

/// Human-readable rank name for any level.
///
/// Sub/super ranks (levels that are not a primary multiple of ten) report the
/// nearest primary rank at or above them, e.g. level 27 formats as "family".
pub fn rank_name(level: f32) -> &'static str {
    PRIMARY_RANKS
        .iter()
        .find(|(l, _)| level <= *l)
        .map_or("stateofmatter", |&(_, name)| name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sub_ranks_round_up() {
        assert_eq!(rank_name(33.0), "order");
        assert_eq!(rank_name(27.0), "family");
        assert_eq!(rank_name(5.0), "subspecies");
        assert_eq!(rank_name(100.0), "stateofmatter");
    }
}
