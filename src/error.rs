//! Error types for taxascore.

/// Result type alias for taxascore operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for taxascore.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration directory could not be determined.
    #[error("could not determine configuration directory for this platform")]
    ConfigDirNotFound,

    /// Failed to read configuration file.
    #[error("failed to read config file '{path}'")]
    ConfigRead {
        /// Path to the config file.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse configuration file.
    #[error("failed to parse config file '{path}'")]
    ConfigParse {
        /// Path to the config file.
        path: std::path::PathBuf,
        /// Underlying parse error.
        #[source]
        source: toml::de::Error,
    },

    /// Configuration validation failed.
    #[error("configuration validation failed: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    /// Failed to write configuration file.
    #[error("failed to write config file '{path}'")]
    ConfigWrite {
        /// Path to the config file.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize configuration.
    #[error("failed to serialize config")]
    ConfigSerialize {
        /// Underlying serialization error.
        #[source]
        source: toml::ser::Error,
    },

    /// Taxonomy asset does not exist.
    #[error("taxonomy file does not exist: {path}")]
    TaxonomyFileNotFound {
        /// Path to the missing taxonomy file.
        path: std::path::PathBuf,
    },

    /// Failed to read the taxonomy asset.
    #[error("failed to read taxonomy file '{path}'")]
    TaxonomyRead {
        /// Path to the taxonomy file.
        path: std::path::PathBuf,
        /// Underlying error.
        #[source]
        source: csv::Error,
    },

    /// Failed to read the mapping asset.
    #[error("failed to read mapping file '{path}'")]
    MappingRead {
        /// Path to the mapping file.
        path: std::path::PathBuf,
        /// Underlying error.
        #[source]
        source: csv::Error,
    },

    /// A taxonomy or mapping record is missing a required field or has a
    /// non-numeric value where a number is required.
    #[error("malformed record at line {line}: {message}")]
    MalformedRecord {
        /// Line number of the bad record (1-based, header included).
        line: u64,
        /// Description of what is wrong with the record.
        message: String,
    },

    /// Score vector length does not match the taxonomy leaf count.
    #[error("score vector has {got} entries but the taxonomy has {expected} leaf classes")]
    ShapeMismatch {
        /// Number of entries in the supplied score vector.
        got: usize,
        /// Number of leaf classes in the loaded taxonomy.
        expected: usize,
    },

    /// Requested taxon id does not exist in the taxonomy.
    #[error("taxon '{taxon_id}' not found in taxonomy")]
    TaxonNotFound {
        /// The missing taxon id.
        taxon_id: String,
    },

    /// Failed to read a score vector file.
    #[error("failed to read score vector file '{path}'")]
    ScoreVectorRead {
        /// Path to the score vector file.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A score vector file contains a non-numeric value.
    #[error("invalid score '{value}' at line {line} of '{path}'")]
    ScoreVectorParse {
        /// Path to the score vector file.
        path: std::path::PathBuf,
        /// Line number of the bad value (1-based).
        line: usize,
        /// The offending text.
        value: String,
    },

    /// No valid score vector files found.
    #[error("no score vector files found in the provided paths")]
    NoInputFiles,

    /// Failed to read the frequency store asset.
    #[error("failed to read frequency store '{path}'")]
    FrequencyRead {
        /// Path to the frequency store file.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse the frequency store asset.
    #[error("failed to parse frequency store '{path}'")]
    FrequencyParse {
        /// Path to the frequency store file.
        path: std::path::PathBuf,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// Failed to write JSON output file.
    #[error("failed to write JSON output file '{path}'")]
    JsonWrite {
        /// Path to the JSON file.
        path: std::path::PathBuf,
        /// Underlying serialization error.
        #[source]
        source: serde_json::Error,
    },

    /// Failed to create output directory.
    #[error("failed to create output directory '{path}'")]
    OutputDirCreateFailed {
        /// Path to the output directory.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}
