//! One batch run: load, normalize, aggregate, rank, write.

use std::collections::HashSet;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::aggregate::{aggregate_parallel, Aggregates};
use crate::categories::CanonicalCategorySet;
use crate::config::PipelineConfig;
use crate::error::PipelineResult;
use crate::fetch::ensure_dataset;
use crate::loader::{open_dataset, LoadReport};
use crate::normalizer::RuleSet;
use crate::output::{render_log_chart, write_csv, write_json, write_text};
use crate::reports::{
    category_rows, chart_series, generate_summary, nonstandard_rows, ranked_rows,
    top_contributors, Metric,
};
use crate::types::{
    CategoryTotalsRow, ImpactRecord, NonStandardRow, RankedRow, SummaryStats, TopContributorRow,
};

const CHART_WIDTH: usize = 50;

pub struct Reports {
    pub rankings: Vec<(Metric, Vec<RankedRow>)>,
    pub contributors: Vec<TopContributorRow>,
    pub nonstandard: Vec<NonStandardRow>,
    pub totals: Vec<CategoryTotalsRow>,
    pub summary: SummaryStats,
    pub health_chart: String,
    pub economic_chart: String,
}

pub struct RunOutcome {
    pub load: LoadReport,
    pub aggregates: Aggregates,
    pub reports: Reports,
}

/// Normalize and aggregate `records` in batches of `batch_size`. Each batch
/// is sharded across the rayon pool; batches are folded in read order.
/// Also returns the set of distinct raw labels seen.
pub fn aggregate_records<I>(
    records: I,
    rules: &RuleSet,
    batch_size: usize,
) -> (Aggregates, HashSet<String>)
where
    I: Iterator<Item = ImpactRecord>,
{
    let batch_size = batch_size.max(1);
    let shard_size = (batch_size / rayon::current_num_threads().max(1)).max(1);
    let mut aggs = Aggregates::new();
    let mut raw_labels: HashSet<String> = HashSet::new();
    let mut batch: Vec<ImpactRecord> = Vec::with_capacity(batch_size);
    let mut batches = 0usize;

    let flush = |batch: &mut Vec<ImpactRecord>, aggs: &mut Aggregates| {
        let partial = aggregate_parallel(batch, rules, shard_size);
        *aggs = std::mem::take(aggs).merge(partial);
        batch.clear();
    };

    for record in records {
        if !raw_labels.contains(&record.category) {
            raw_labels.insert(record.category.clone());
        }
        batch.push(record);
        if batch.len() == batch_size {
            flush(&mut batch, &mut aggs);
            batches += 1;
            debug!(batches, categories = aggs.len(), "batch aggregated");
        }
    }
    if !batch.is_empty() {
        flush(&mut batch, &mut aggs);
    }
    (aggs, raw_labels)
}

pub fn build_reports(
    aggs: &Aggregates,
    canonical: &CanonicalCategorySet,
    load: &LoadReport,
    raw_labels: &HashSet<String>,
    top_n: usize,
) -> Reports {
    let rankings = Metric::ALL
        .iter()
        .map(|&m| (m, ranked_rows(aggs, m, top_n)))
        .collect();

    let health = [Metric::Fatalities, Metric::Injuries];
    let economic = [Metric::PropertyDamage, Metric::CropDamage];
    let health_chart = render_log_chart(
        &format!("Health impact, top {} event types", top_n),
        &health.map(Metric::label),
        &chart_series(aggs, &health, top_n),
        CHART_WIDTH,
    );
    let economic_chart = render_log_chart(
        &format!("Economic impact, top {} event types", top_n),
        &economic.map(Metric::label),
        &chart_series(aggs, &economic, top_n),
        CHART_WIDTH,
    );

    Reports {
        rankings,
        contributors: top_contributors(aggs),
        nonstandard: nonstandard_rows(aggs, canonical),
        totals: category_rows(aggs, canonical),
        summary: generate_summary(aggs, canonical, load, raw_labels),
        health_chart,
        economic_chart,
    }
}

pub fn write_reports(reports: &Reports, dir: &Path) -> PipelineResult<()> {
    std::fs::create_dir_all(dir)?;
    for (metric, rows) in &reports.rankings {
        write_csv(&dir.join(format!("{}.csv", metric.file_stem())), rows)?;
    }
    write_csv(&dir.join("top_contributors.csv"), &reports.contributors)?;
    write_csv(&dir.join("nonstandard_categories.csv"), &reports.nonstandard)?;
    write_csv(&dir.join("category_totals.csv"), &reports.totals)?;
    write_json(&dir.join("summary.json"), &reports.summary)?;
    write_text(&dir.join("health_chart.txt"), &reports.health_chart)?;
    write_text(&dir.join("economic_chart.txt"), &reports.economic_chart)?;
    info!(dir = %dir.display(), "reports written");
    Ok(())
}

/// Run the whole pipeline. The category list is checked before the
/// dataset is touched.
pub fn run(config: &PipelineConfig) -> PipelineResult<RunOutcome> {
    let started = Instant::now();
    let canonical = CanonicalCategorySet::load(&config.categories_path)?;
    info!(categories = canonical.len(), "canonical category set loaded");

    let mut rules = RuleSet::standard()?;
    if let Some(path) = &config.extra_rules_path {
        let added = rules.extend_from_file(path)?;
        info!(added, path = %path.display(), "extra rewrite rules appended");
    }
    debug!(rules = rules.len(), "rule cascade ready");

    let dataset = ensure_dataset(&config.dataset_path, &config.dataset_url)?;
    let mut stream = open_dataset(&dataset, config.min_year)?;
    let (aggregates, raw_labels) = aggregate_records(stream.by_ref(), &rules, config.batch_size);
    let load = stream.finish()?;
    info!(
        total = load.total_rows,
        retained = load.retained_rows,
        zero_impact = load.zero_impact_rows,
        out_of_range = load.out_of_range_rows,
        undated = load.undated_rows,
        parse_errors = load.parse_errors,
        "dataset processed"
    );
    if load.parse_errors > 0 {
        warn!(rows = load.parse_errors, "rows skipped due to parse errors");
    }

    let reports = build_reports(&aggregates, &canonical, &load, &raw_labels, config.top_n);
    info!(
        raw_labels = reports.summary.distinct_raw_labels,
        categories = reports.summary.distinct_categories,
        nonstandard = reports.summary.nonstandard_categories,
        "labels normalized"
    );
    write_reports(&reports, &config.output_dir)?;
    info!(elapsed_ms = started.elapsed().as_millis() as u64, "run complete");

    Ok(RunOutcome {
        load,
        aggregates,
        reports,
    })
}
