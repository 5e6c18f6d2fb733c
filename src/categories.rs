//! The closed set of standard event types.
//!
//! The reference list is the storm data directive's event table, one name
//! per line, optionally followed by the zone designator the directive
//! uses (` C` county, ` M` marine, ` Z` forecast zone).

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::error::{PipelineError, PipelineResult};

static SCOPE_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+[CMZ]$").expect("valid scope suffix regex"));

#[derive(Debug, Clone, Default)]
pub struct CanonicalCategorySet {
    names: HashSet<String>,
}

impl CanonicalCategorySet {
    /// Read the reference list. A missing file aborts the run since no
    /// normalized label could be validated without it.
    pub fn load<P: AsRef<Path>>(path: P) -> PipelineResult<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(PipelineError::CategoryListMissing {
                path: path.to_path_buf(),
            });
        }
        let text = fs::read_to_string(path)?;
        let set = Self::parse(&text);
        debug!(count = set.len(), path = %path.display(), "loaded canonical categories");
        Ok(set)
    }

    pub fn parse(text: &str) -> Self {
        let names = text
            .lines()
            .map(|line| line.trim().to_uppercase())
            .filter(|line| !line.is_empty())
            .map(|line| SCOPE_SUFFIX.replace(&line, "").trim_end().to_string())
            .collect();
        CanonicalCategorySet { names }
    }

    pub fn contains(&self, category: &str) -> bool {
        self.names.contains(category)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Names in sorted order, for stable iteration in reports and tests.
    pub fn sorted(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.names.iter().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
