use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the harvest dashboard crates.
#[derive(Error, Debug)]
pub enum HarvestError {
    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A JSON document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// A CSV export could not be parsed.
    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    /// A required column binding is not present in any row of the dataset.
    #[error("Column \"{column}\" bound as {role} was not found in the data")]
    MissingColumn { role: &'static str, column: String },

    /// A column binding was configured with an empty label.
    #[error("Column binding for {0} is empty")]
    EmptyBinding(&'static str),

    /// The configured data source does not exist.
    #[error("Data source not found: {0}")]
    SourceNotFound(PathBuf),

    /// The data source has an extension no reader understands.
    #[error("Unsupported data source format: {0}")]
    UnsupportedFormat(String),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl HarvestError {
    /// `true` when the settings (column bindings, date order) are at fault
    /// rather than the data source.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            HarvestError::MissingColumn { .. } | HarvestError::EmptyBinding(_) | HarvestError::Config(_)
        )
    }
}

/// Convenience alias used throughout the harvest crates.
pub type Result<T> = std::result::Result<T, HarvestError>;
