//! Error types for cineload.

use thiserror::Error;

/// Library-level error type for cineload operations.
#[derive(Error, Debug)]
pub enum CineloadError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing required column '{0}' in input header")]
    MissingColumn(String),

    #[error("Missing value for required column '{column}' on line {line}")]
    MissingValue { line: u64, column: String },

    #[error("Index request failed with status {status}: {body}")]
    Transport { status: u16, body: String },

    #[error("Upload of batch {batch} failed after {acknowledged} acknowledged batches: {source}")]
    Upload {
        batch: usize,
        acknowledged: usize,
        #[source]
        source: Box<CineloadError>,
    },

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
}

/// Result type alias for cineload operations.
pub type Result<T> = std::result::Result<T, CineloadError>;
