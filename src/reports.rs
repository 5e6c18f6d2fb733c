use std::collections::HashSet;

use crate::aggregate::{Aggregates, CategoryTotals};
use crate::categories::CanonicalCategorySet;
use crate::loader::LoadReport;
use crate::types::{
    CategoryTotalsRow, Money, NonStandardRow, RankedRow, SummaryStats, TopContributorRow,
};
use crate::util::{format_cents, format_int};

/// The four summed impact measures a ranking can be taken over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Fatalities,
    Injuries,
    PropertyDamage,
    CropDamage,
}

impl Metric {
    pub const ALL: [Metric; 4] = [
        Metric::Fatalities,
        Metric::Injuries,
        Metric::PropertyDamage,
        Metric::CropDamage,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Metric::Fatalities => "Fatalities",
            Metric::Injuries => "Injuries",
            Metric::PropertyDamage => "Property Damage (USD)",
            Metric::CropDamage => "Crop Damage (USD)",
        }
    }

    pub fn file_stem(self) -> &'static str {
        match self {
            Metric::Fatalities => "top_fatalities",
            Metric::Injuries => "top_injuries",
            Metric::PropertyDamage => "top_property_damage",
            Metric::CropDamage => "top_crop_damage",
        }
    }

    /// Exact ranking key. Money metrics are in cents.
    pub fn value(self, totals: &CategoryTotals) -> u64 {
        match self {
            Metric::Fatalities => totals.fatalities,
            Metric::Injuries => totals.injuries,
            Metric::PropertyDamage => totals.property_damage.cents(),
            Metric::CropDamage => totals.crop_damage.cents(),
        }
    }

    /// Value in display units (people or dollars), for charts.
    pub fn amount(self, totals: &CategoryTotals) -> f64 {
        match self {
            Metric::Fatalities | Metric::Injuries => self.value(totals) as f64,
            Metric::PropertyDamage => totals.property_damage.dollars(),
            Metric::CropDamage => totals.crop_damage.dollars(),
        }
    }

    pub fn format(self, value: u64) -> String {
        match self {
            Metric::Fatalities | Metric::Injuries => format_int(value),
            Metric::PropertyDamage | Metric::CropDamage => format_cents(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedEntry {
    pub category: String,
    pub value: u64,
}

/// Top `n` categories by `metric`, descending. Equal values keep the
/// aggregate table's first-appearance order.
pub fn top_n(aggs: &Aggregates, metric: Metric, n: usize) -> Vec<RankedEntry> {
    let mut entries: Vec<RankedEntry> = aggs
        .iter()
        .map(|t| RankedEntry {
            category: t.category.clone(),
            value: metric.value(t),
        })
        .collect();
    // `sort_by` is stable.
    entries.sort_by(|a, b| b.value.cmp(&a.value));
    entries.truncate(n);
    entries
}

pub fn ranked_rows(aggs: &Aggregates, metric: Metric, n: usize) -> Vec<RankedRow> {
    top_n(aggs, metric, n)
        .into_iter()
        .enumerate()
        .map(|(idx, e)| RankedRow {
            rank: idx + 1,
            category: e.category,
            value: metric.format(e.value),
        })
        .collect()
}

/// One row per metric naming its rank-1 category. Metrics with no data
/// (empty table) are left out.
pub fn top_contributors(aggs: &Aggregates) -> Vec<TopContributorRow> {
    Metric::ALL
        .iter()
        .filter_map(|&metric| {
            top_n(aggs, metric, 1).into_iter().next().map(|e| TopContributorRow {
                metric: metric.label().to_string(),
                category: e.category,
                value: metric.format(e.value),
            })
        })
        .collect()
}

pub fn category_rows(aggs: &Aggregates, canonical: &CanonicalCategorySet) -> Vec<CategoryTotalsRow> {
    let mut rows: Vec<CategoryTotalsRow> = aggs
        .iter()
        .map(|t| CategoryTotalsRow {
            category: t.category.clone(),
            standard: canonical.contains(&t.category),
            records: t.records,
            fatalities: t.fatalities,
            injuries: t.injuries,
            property_damage: format_cents(t.property_damage.cents()),
            crop_damage: format_cents(t.crop_damage.cents()),
        })
        .collect();
    rows.sort_by(|a, b| a.category.cmp(&b.category));
    rows
}

/// Residual labels the cascade did not map into the canonical set, most
/// frequent first.
pub fn nonstandard_rows(aggs: &Aggregates, canonical: &CanonicalCategorySet) -> Vec<NonStandardRow> {
    let mut rows: Vec<NonStandardRow> = aggs
        .iter()
        .filter(|t| !canonical.contains(&t.category))
        .map(|t| NonStandardRow {
            category: t.category.clone(),
            records: t.records,
        })
        .collect();
    rows.sort_by(|a, b| b.records.cmp(&a.records));
    rows
}

/// Bars for a two-series comparison chart: the `n` categories with the
/// largest combined value across `metrics`, in descending order.
pub fn chart_series(aggs: &Aggregates, metrics: &[Metric], n: usize) -> Vec<(String, Vec<f64>)> {
    let mut scored: Vec<(f64, &CategoryTotals)> = aggs
        .iter()
        .map(|t| (metrics.iter().map(|m| m.amount(t)).sum::<f64>(), t))
        .filter(|(total, _)| *total > 0.0)
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    scored
        .into_iter()
        .take(n)
        .map(|(_, t)| {
            let values = metrics.iter().map(|m| m.amount(t)).collect();
            (t.category.clone(), values)
        })
        .collect()
}

pub fn generate_summary(
    aggs: &Aggregates,
    canonical: &CanonicalCategorySet,
    load: &LoadReport,
    raw_labels: &HashSet<String>,
) -> SummaryStats {
    let nonstandard: Vec<&CategoryTotals> = aggs
        .iter()
        .filter(|t| !canonical.contains(&t.category))
        .collect();
    let mut total_fatalities = 0u64;
    let mut total_injuries = 0u64;
    let mut total_property = Money::ZERO;
    let mut total_crop = Money::ZERO;
    for t in aggs {
        total_fatalities = total_fatalities.saturating_add(t.fatalities);
        total_injuries = total_injuries.saturating_add(t.injuries);
        total_property += t.property_damage;
        total_crop += t.crop_damage;
    }
    SummaryStats {
        generated_at: chrono::Utc::now(),
        total_rows: load.total_rows,
        retained_rows: load.retained_rows,
        zero_impact_rows: load.zero_impact_rows,
        out_of_range_rows: load.out_of_range_rows,
        undated_rows: load.undated_rows,
        parse_errors: load.parse_errors,
        distinct_raw_labels: raw_labels.len(),
        distinct_categories: aggs.len(),
        nonstandard_categories: nonstandard.len(),
        nonstandard_records: nonstandard.iter().map(|t| t.records).sum(),
        total_fatalities,
        total_injuries,
        total_property_damage: total_property.dollars(),
        total_crop_damage: total_crop.dollars(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NormalizedRecord;

    fn rec(category: &str, injuries: u64, fatalities: u64, prop: u64, crop: u64) -> NormalizedRecord {
        NormalizedRecord {
            category: category.to_string(),
            fatalities,
            injuries,
            property_damage: Money::from_dollars(prop),
            crop_damage: Money::from_dollars(crop),
        }
    }

    fn scenario() -> Aggregates {
        Aggregates::from_records(&[
            rec("TORNADO", 100, 5, 0, 0),
            rec("FLOOD", 10, 0, 5_000_000, 1_000_000),
            rec("TORNADO", 50, 2, 0, 0),
        ])
    }

    #[test]
    fn top_one_per_metric_matches_the_worked_example() {
        let aggs = scenario();
        let inj = top_n(&aggs, Metric::Injuries, 1);
        assert_eq!(inj, vec![RankedEntry { category: "TORNADO".into(), value: 150 }]);
        let prop = top_n(&aggs, Metric::PropertyDamage, 1);
        assert_eq!(prop[0].category, "FLOOD");
        assert_eq!(prop[0].value, Money::from_dollars(5_000_000).cents());

        let rows = top_contributors(&aggs);
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[1].category, "TORNADO");
        assert_eq!(rows[1].value, "150");
        assert_eq!(rows[2].category, "FLOOD");
        assert_eq!(rows[2].value, "5,000,000.00");
        assert_eq!(rows[3].value, "1,000,000.00");
    }

    #[test]
    fn n_larger_than_table_returns_every_category() {
        let aggs = scenario();
        assert_eq!(top_n(&aggs, Metric::Fatalities, 10).len(), 2);
        assert!(top_n(&aggs, Metric::Fatalities, 0).is_empty());
    }

    #[test]
    fn ties_keep_first_appearance_order() {
        let aggs = Aggregates::from_records(&[
            rec("HAIL", 0, 3, 0, 0),
            rec("HEAT", 0, 9, 0, 0),
            rec("FOG", 0, 3, 0, 0),
            rec("DUST STORM", 0, 3, 0, 0),
        ]);
        let names: Vec<String> = top_n(&aggs, Metric::Fatalities, 4)
            .into_iter()
            .map(|e| e.category)
            .collect();
        assert_eq!(names, vec!["HEAT", "HAIL", "FOG", "DUST STORM"]);
        for _ in 0..5 {
            assert_eq!(
                top_n(&aggs, Metric::Fatalities, 3),
                top_n(&aggs, Metric::Fatalities, 3)
            );
        }
    }

    #[test]
    fn ranked_rows_are_numbered_and_formatted() {
        let rows = ranked_rows(&scenario(), Metric::Injuries, 5);
        assert_eq!(rows[0].rank, 1);
        assert_eq!(rows[1].rank, 2);
        assert_eq!(rows[1].category, "FLOOD");
        assert_eq!(rows[1].value, "10");
    }

    #[test]
    fn nonstandard_and_summary_diagnostics() {
        let canonical = CanonicalCategorySet::parse("Tornado Z\nFlood C\n");
        let aggs = Aggregates::from_records(&[
            rec("TORNADO", 1, 0, 0, 0),
            rec("MUDSLIDE", 0, 1, 0, 0),
            rec("MUDSLIDE", 0, 1, 0, 0),
            rec("OTHER", 1, 0, 0, 0),
        ]);
        let residual = nonstandard_rows(&aggs, &canonical);
        assert_eq!(residual.len(), 2);
        assert_eq!(residual[0].category, "MUDSLIDE");
        assert_eq!(residual[0].records, 2);

        let totals = category_rows(&aggs, &canonical);
        assert_eq!(totals.iter().filter(|r| r.standard).count(), 1);

        let raw: HashSet<String> = ["Tornado", "MUD SLIDE", "Mudslide", "OTHER"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let load = LoadReport { total_rows: 6, retained_rows: 4, zero_impact_rows: 2, ..Default::default() };
        let summary = generate_summary(&aggs, &canonical, &load, &raw);
        assert_eq!(summary.distinct_raw_labels, 4);
        assert_eq!(summary.distinct_categories, 3);
        assert_eq!(summary.nonstandard_categories, 2);
        assert_eq!(summary.nonstandard_records, 3);
        assert_eq!(summary.total_fatalities, 2);
        assert_eq!(summary.total_injuries, 2);
    }

    #[test]
    fn chart_series_ranks_by_combined_value_and_skips_empty() {
        let aggs = Aggregates::from_records(&[
            rec("TORNADO", 100, 5, 0, 0),
            rec("FLOOD", 10, 0, 5_000_000, 1_000_000),
            rec("DROUGHT", 0, 0, 0, 7),
        ]);
        let bars = chart_series(&aggs, &[Metric::Fatalities, Metric::Injuries], 10);
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0], ("TORNADO".to_string(), vec![5.0, 100.0]));
        let econ = chart_series(&aggs, &[Metric::PropertyDamage, Metric::CropDamage], 1);
        assert_eq!(econ, vec![("FLOOD".to_string(), vec![5_000_000.0, 1_000_000.0])]);
    }
}
