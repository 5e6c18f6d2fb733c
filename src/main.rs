// Entry point: one non-interactive pass over the storm database.
//
// Configuration comes from `stormdata.toml` and `STORMDATA_*` variables.
// Logs go to stderr through `tracing`; report previews go to stdout.
use anyhow::Context;
use storm_report::output::preview_table;
use storm_report::pipeline::{self, RunOutcome};
use storm_report::util::{format_int, format_number};
use storm_report::PipelineConfig;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("storm_report=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_outcome(outcome: &RunOutcome, config: &PipelineConfig) {
    let load = &outcome.load;
    let summary = &outcome.reports.summary;
    println!(
        "Processing dataset... ({} rows read, {} with recorded impact)",
        format_int(load.total_rows),
        format_int(load.retained_rows)
    );
    if load.out_of_range_rows > 0 {
        println!(
            "Note: {} rows dated before {} skipped.",
            format_int(load.out_of_range_rows),
            config.min_year.unwrap_or_default()
        );
    }
    if load.undated_rows > 0 {
        println!(
            "Note: {} rows without a readable begin date skipped.",
            format_int(load.undated_rows)
        );
    }
    println!(
        "Note: {} rows skipped due to parse/validation errors.",
        format_int(load.parse_errors)
    );
    println!(
        "Labels: {} distinct raw, {} after normalization, {} non-standard ({} records).",
        format_int(summary.distinct_raw_labels),
        format_int(summary.distinct_categories),
        format_int(summary.nonstandard_categories),
        format_int(summary.nonstandard_records)
    );

    let rows = config.preview_rows;
    for (metric, ranked) in &outcome.reports.rankings {
        let title = format!("Top {} Event Types by {}", config.top_n, metric.label());
        preview_table(&title, None, ranked, rows);
    }
    preview_table(
        "Top Contributor per Metric",
        None,
        &outcome.reports.contributors,
        outcome.reports.contributors.len(),
    );
    preview_table(
        "Non-standard Event Types",
        Some("labels no rule mapped onto a standard event type"),
        &outcome.reports.nonstandard,
        rows,
    );
    println!("{}", outcome.reports.health_chart);
    println!("{}", outcome.reports.economic_chart);

    println!("Summary Stats (summary.json):");
    println!(
        "{{\"total_fatalities\": {}, \"total_injuries\": {}, \"total_property_damage\": {}, \"total_crop_damage\": {}}}\n",
        format_int(summary.total_fatalities),
        format_int(summary.total_injuries),
        format_number(summary.total_property_damage, 2),
        format_number(summary.total_crop_damage, 2)
    );
    println!("(Full tables exported to {})", config.output_dir.display());
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let config = PipelineConfig::load().context("failed to load configuration")?;
    let outcome = pipeline::run(&config).context("storm report run failed")?;
    print_outcome(&outcome, &config);
    Ok(())
}
