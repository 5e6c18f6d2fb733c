//! Per-category impact totals.
//!
//! [`Aggregates`] keeps categories in first-appearance order. Merging two
//! tables appends the right-hand side's new categories after the
//! left-hand side's, so shards merged in input order reproduce exactly the
//! order a sequential pass would have produced. That order is the ranking
//! tie-break.

use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashMap;

use crate::normalizer::RuleSet;
use crate::types::{ImpactRecord, Money, NormalizedRecord};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategoryTotals {
    pub category: String,
    pub records: u64,
    pub fatalities: u64,
    pub injuries: u64,
    pub property_damage: Money,
    pub crop_damage: Money,
}

impl CategoryTotals {
    fn empty(category: &str) -> Self {
        CategoryTotals {
            category: category.to_string(),
            ..Default::default()
        }
    }

    fn absorb(&mut self, record: &NormalizedRecord) {
        self.records += 1;
        self.fatalities = self.fatalities.saturating_add(record.fatalities);
        self.injuries = self.injuries.saturating_add(record.injuries);
        self.property_damage += record.property_damage;
        self.crop_damage += record.crop_damage;
    }

    fn combine(&mut self, other: &CategoryTotals) {
        self.records += other.records;
        self.fatalities = self.fatalities.saturating_add(other.fatalities);
        self.injuries = self.injuries.saturating_add(other.injuries);
        self.property_damage += other.property_damage;
        self.crop_damage += other.crop_damage;
    }
}

#[derive(Debug, Clone, Default)]
pub struct Aggregates {
    entries: Vec<CategoryTotals>,
    index: HashMap<String, usize>,
}

impl Aggregates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a NormalizedRecord>,
    {
        let mut aggs = Aggregates::new();
        for record in records {
            aggs.add(record);
        }
        aggs
    }

    fn slot(&mut self, category: &str) -> &mut CategoryTotals {
        let idx = match self.index.get(category) {
            Some(&idx) => idx,
            None => {
                self.entries.push(CategoryTotals::empty(category));
                self.index.insert(category.to_string(), self.entries.len() - 1);
                self.entries.len() - 1
            }
        };
        &mut self.entries[idx]
    }

    pub fn add(&mut self, record: &NormalizedRecord) {
        self.slot(&record.category).absorb(record);
    }

    /// Fold `other` into `self`. Sums are exact, so the result does not
    /// depend on how the records were split.
    pub fn merge(mut self, other: Aggregates) -> Aggregates {
        for totals in &other.entries {
            self.slot(&totals.category).combine(totals);
        }
        self
    }

    pub fn get(&self, category: &str) -> Option<&CategoryTotals> {
        self.index.get(category).map(|&idx| &self.entries[idx])
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CategoryTotals> {
        self.entries.iter()
    }

    pub fn categories(&self) -> Vec<&str> {
        self.entries.iter().map(|t| t.category.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Equality of the category → totals mapping; insertion order is ignored.
impl PartialEq for Aggregates {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .entries
                .iter()
                .all(|t| other.get(&t.category) == Some(t))
    }
}

impl Eq for Aggregates {}

impl<'a> IntoIterator for &'a Aggregates {
    type Item = &'a CategoryTotals;
    type IntoIter = std::slice::Iter<'a, CategoryTotals>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl NormalizedRecord {
    pub fn from_impact(record: &ImpactRecord, rules: &RuleSet) -> Self {
        Self::with_category(record, rules.normalize(&record.category))
    }

    /// Build from an already normalized category.
    pub fn with_category(record: &ImpactRecord, category: String) -> Self {
        NormalizedRecord {
            category,
            fatalities: record.fatalities,
            injuries: record.injuries,
            property_damage: record.property_damage(),
            crop_damage: record.crop_damage(),
        }
    }
}

/// Normalize and aggregate one shard. The storm database has only about a
/// thousand distinct spellings, so each shard memoizes the cascade.
pub fn aggregate_shard(records: &[ImpactRecord], rules: &RuleSet) -> Aggregates {
    let mut memo: HashMap<&str, String> = HashMap::new();
    let mut aggs = Aggregates::new();
    for record in records {
        let category = memo
            .entry(record.category.as_str())
            .or_insert_with(|| rules.normalize(&record.category));
        aggs.add(&NormalizedRecord::with_category(record, category.clone()));
    }
    aggs
}

/// Split `records` into shards of `shard_size`, aggregate them on the rayon
/// pool and merge the partial tables in shard order.
pub fn aggregate_parallel(records: &[ImpactRecord], rules: &RuleSet, shard_size: usize) -> Aggregates {
    records
        .par_chunks(shard_size.max(1))
        .map(|shard| aggregate_shard(shard, rules))
        .reduce(Aggregates::new, Aggregates::merge)
}
