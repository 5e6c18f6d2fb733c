//! Error types for the storm report pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors that abort a pipeline run.
///
/// Row-level problems (bad numbers, unknown exponent codes, labels no rule
/// matches) never surface here; they are counted in the load and
/// normalization diagnostics instead.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The canonical category reference list is a hard precondition
    #[error("Canonical category list not found: {path}")]
    CategoryListMissing { path: PathBuf },

    /// Dataset is neither cached locally nor fetchable
    #[error("Dataset unavailable at {path}")]
    DatasetUnavailable { path: PathBuf },

    /// HTTP transport failure while fetching the dataset
    #[error("Failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Non-success HTTP status while fetching the dataset
    #[error("Fetching {url} returned HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    /// A rewrite rule pattern failed to compile
    #[error("Invalid rewrite pattern {pattern:?}: {source}")]
    InvalidRule {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}
