//! Storm database impact analysis.
//!
//! Loads the NOAA storm event export, folds its free-text event labels onto
//! the standard event types with an ordered rewrite cascade, sums health
//! and economic impact per event type and writes ranked reports.

pub mod aggregate;
pub mod categories;
pub mod config;
pub mod error;
pub mod exponent;
pub mod fetch;
pub mod loader;
pub mod normalizer;
pub mod output;
pub mod pipeline;
pub mod reports;
pub mod types;
pub mod util;

pub use aggregate::{Aggregates, CategoryTotals};
pub use categories::CanonicalCategorySet;
pub use config::PipelineConfig;
pub use error::{PipelineError, PipelineResult};
pub use normalizer::{normalize, RuleSet};
pub use reports::{top_n, Metric, RankedEntry};
pub use types::{ImpactRecord, Money, NormalizedRecord};
