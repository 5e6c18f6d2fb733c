//! Run configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::PipelineResult;

/// Where the NOAA storm database export is published.
pub const DEFAULT_DATASET_URL: &str =
    "https://d396qusza40orc.cloudfront.net/repdata%2Fdata%2FStormData.csv.bz2";

/// Pipeline settings. Every field has a default, so an empty or absent
/// `stormdata.toml` is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Local dataset path; doubles as the download cache
    pub dataset_path: PathBuf,

    /// Fetched when `dataset_path` does not exist. Empty disables fetching.
    pub dataset_url: String,

    /// Canonical event type list, one name per line
    pub categories_path: PathBuf,

    pub output_dir: PathBuf,

    /// Rows per ranking table
    pub top_n: usize,

    /// Records read before a batch is normalized and aggregated in parallel
    pub batch_size: usize,

    /// Drop events that began before this year
    #[serde(default)]
    pub min_year: Option<i32>,

    /// JSON list of `{pattern, replacement}` rules run after the built-ins
    #[serde(default)]
    pub extra_rules_path: Option<PathBuf>,

    /// Rows shown in console previews
    pub preview_rows: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            dataset_path: PathBuf::from("data/StormData.csv.bz2"),
            dataset_url: DEFAULT_DATASET_URL.to_string(),
            categories_path: PathBuf::from("data/event_types.txt"),
            output_dir: PathBuf::from("output"),
            top_n: 10,
            batch_size: 100_000,
            min_year: None,
            extra_rules_path: None,
            preview_rows: 5,
        }
    }
}

impl PipelineConfig {
    /// Load from `stormdata.toml` in the working directory (optional),
    /// then `STORMDATA_*` environment variables.
    pub fn load() -> PipelineResult<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("stormdata").required(false))
            .add_source(config::Environment::with_prefix("STORMDATA").try_parsing(true))
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    /// Load from an explicit file only.
    pub fn load_file<P: AsRef<Path>>(path: P) -> PipelineResult<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .build()?;
        Ok(settings.try_deserialize()?)
    }
}
