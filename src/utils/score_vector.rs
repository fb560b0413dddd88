//! Score vector file reading utilities.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Read a model score vector from file.
///
/// # File Format
/// - One probability per line, in model output order
/// - Blank lines are ignored
/// - Values are expected in `[0, 1]` but are not clamped here; shape and
///   range errors surface downstream
///
/// # Errors
/// - Returns error if the file cannot be read
/// - Returns error if a non-blank line is not a valid float
pub fn read_score_vector(path: &Path) -> Result<Vec<f32>> {
    let file = File::open(path).map_err(|e| Error::ScoreVectorRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let reader = BufReader::new(file);
    let mut scores = Vec::new();

    for (line_index, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| Error::ScoreVectorRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let value: f32 = trimmed.parse().map_err(|_| Error::ScoreVectorParse {
            path: path.to_path_buf(),
            line: line_index + 1,
            value: trimmed.to_string(),
        })?;
        scores.push(value);
    }

    Ok(scores)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_score_vector_valid_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "0.5").unwrap();
        writeln!(file).unwrap(); // blank line should be ignored
        writeln!(file, "0.25").unwrap();
        writeln!(file, "0.125").unwrap();

        let scores = read_score_vector(file.path()).unwrap();
        assert_eq!(scores, vec![0.5, 0.25, 0.125]);
    }

    #[test]
    fn test_read_score_vector_rejects_non_numeric() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "0.5").unwrap();
        writeln!(file, "not-a-number").unwrap();

        let err = read_score_vector(file.path()).unwrap_err();
        assert!(matches!(err, Error::ScoreVectorParse { line: 2, .. }));
    }

    #[test]
    fn test_read_score_vector_file_not_found() {
        let result = read_score_vector(std::path::Path::new("nonexistent.scores"));
        assert!(result.is_err());
    }
}
