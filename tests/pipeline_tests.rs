use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use storm_report::pipeline;
use storm_report::{PipelineConfig, PipelineError};

const HEADER: &str =
    "STATE__,BGN_DATE,COUNTYNAME,EVTYPE,FATALITIES,INJURIES,PROPDMG,PROPDMGEXP,CROPDMG,CROPDMGEXP,REMARKS\n";

const BODY: &str = "\
1.00,4/18/1950 0:00:00,MOBILE,TORNADO,5,100,0,,0,,
1.00,6/1/1995 0:00:00,BALDWIN,Flood,0,10,5,M,1,m,\"river out of banks, roads closed\"
1.00,5/3/1996 0:00:00,MOBILE,  tornado ,2,50,0,,0,,
1.00,5/3/1996 0:00:00,MOBILE,HAIL,0,0,0,,0,,
1.00,7/4/2001 0:00:00,APACHE,OTHER,0,1,0,,0,,
1.00,7/4/2001 0:00:00,APACHE,WHIRLWIND,0,0,2,K,0,,
";

fn categories_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("data/event_types.txt")
}

fn config_for(dir: &Path, dataset: &Path) -> PipelineConfig {
    PipelineConfig {
        dataset_path: dataset.to_path_buf(),
        dataset_url: String::new(),
        categories_path: categories_path(),
        output_dir: dir.join("out"),
        top_n: 10,
        batch_size: 2,
        ..Default::default()
    }
}

fn write_csv(dir: &Path) -> PathBuf {
    let path = dir.join("StormData.csv");
    fs::write(&path, format!("{HEADER}{BODY}")).unwrap();
    path
}

#[test]
fn end_to_end_totals_and_rankings() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = write_csv(dir.path());
    let config = config_for(dir.path(), &dataset);

    let outcome = pipeline::run(&config).unwrap();
    assert_eq!(outcome.load.total_rows, 6);
    assert_eq!(outcome.load.retained_rows, 5);
    assert_eq!(outcome.load.zero_impact_rows, 1);

    let tornado = outcome.aggregates.get("TORNADO").unwrap();
    assert_eq!((tornado.injuries, tornado.fatalities, tornado.records), (150, 7, 2));
    let flood = outcome.aggregates.get("FLOOD").unwrap();
    assert_eq!(flood.property_damage.dollars(), 5_000_000.0);
    assert_eq!(flood.crop_damage.dollars(), 1_000_000.0);

    let out = config.output_dir;
    let injuries = fs::read_to_string(out.join("top_injuries.csv")).unwrap();
    assert!(injuries.starts_with("Rank,EventType,Value\n1,TORNADO,150\n2,FLOOD,10\n"));
    let property = fs::read_to_string(out.join("top_property_damage.csv")).unwrap();
    assert!(property.contains("1,FLOOD,\"5,000,000.00\""));

    let contributors = fs::read_to_string(out.join("top_contributors.csv")).unwrap();
    assert!(contributors.contains("Injuries,TORNADO,150"));
    assert!(contributors.contains("Fatalities,TORNADO,7"));

    let residual = fs::read_to_string(out.join("nonstandard_categories.csv")).unwrap();
    assert!(residual.contains("OTHER,1"));
    assert!(residual.contains("WHIRLWIND,1"));
    assert!(!residual.contains("TORNADO"));

    let summary: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join("summary.json")).unwrap()).unwrap();
    assert_eq!(summary["distinct_raw_labels"], 5);
    assert_eq!(summary["distinct_categories"], 4);
    assert_eq!(summary["nonstandard_categories"], 2);
    assert_eq!(summary["total_fatalities"], 7);

    for name in [
        "top_fatalities.csv",
        "top_crop_damage.csv",
        "category_totals.csv",
        "health_chart.txt",
        "economic_chart.txt",
    ] {
        assert!(out.join(name).is_file(), "{name} missing");
    }
}

#[test]
fn reads_bzip2_compressed_input() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = dir.path().join("StormData.csv.bz2");
    let mut encoder = bzip2::write::BzEncoder::new(
        fs::File::create(&dataset).unwrap(),
        bzip2::Compression::default(),
    );
    encoder.write_all(format!("{HEADER}{BODY}").as_bytes()).unwrap();
    encoder.finish().unwrap();

    let outcome = pipeline::run(&config_for(dir.path(), &dataset)).unwrap();
    assert_eq!(outcome.load.retained_rows, 5);
    assert_eq!(outcome.aggregates.get("TORNADO").unwrap().injuries, 150);
}

#[test]
fn min_year_filters_early_events() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = write_csv(dir.path());
    let config = PipelineConfig {
        min_year: Some(1996),
        ..config_for(dir.path(), &dataset)
    };

    let outcome = pipeline::run(&config).unwrap();
    assert_eq!(outcome.load.out_of_range_rows, 2);
    assert_eq!(outcome.load.undated_rows, 0);
    assert_eq!(outcome.load.parse_errors, 0);
    assert!(outcome.aggregates.get("FLOOD").is_none());
    let tornado = outcome.aggregates.get("TORNADO").unwrap();
    assert_eq!((tornado.injuries, tornado.fatalities), (50, 2));
}

#[test]
fn extra_rules_run_after_the_builtins() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = write_csv(dir.path());
    let rules = dir.path().join("rules.json");
    fs::write(
        &rules,
        r#"[{"pattern": "^WHIRLWIND$", "replacement": "DUST DEVIL"}]"#,
    )
    .unwrap();
    let config = PipelineConfig {
        extra_rules_path: Some(rules),
        ..config_for(dir.path(), &dataset)
    };

    let outcome = pipeline::run(&config).unwrap();
    assert!(outcome.aggregates.get("WHIRLWIND").is_none());
    assert_eq!(outcome.aggregates.get("DUST DEVIL").unwrap().records, 1);
    assert_eq!(outcome.reports.summary.nonstandard_categories, 1);
}

#[test]
fn missing_category_list_aborts_before_the_dataset() {
    let dir = tempfile::tempdir().unwrap();
    let config = PipelineConfig {
        categories_path: dir.path().join("event_types.txt"),
        ..config_for(dir.path(), &dir.path().join("absent.csv"))
    };

    let err = pipeline::run(&config).err().unwrap();
    assert!(matches!(err, PipelineError::CategoryListMissing { .. }));
    assert!(!config.output_dir.exists());
}

#[test]
fn missing_dataset_without_url_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(dir.path(), &dir.path().join("absent.csv"));

    let err = pipeline::run(&config).err().unwrap();
    assert!(matches!(err, PipelineError::DatasetUnavailable { .. }));
}

#[test]
fn compound_hurricane_rows_and_fractional_damage() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = dir.path().join("StormData.csv");
    let body = "\
1.00,8/29/2005 0:00:00,ORLEANS,HURRICANE AND HIGH WINDS,0,0,0.001,B,0,,
1.00,8/29/2005 0:00:00,ORLEANS,\"Hurricane, Flood\",0,0,0.125,M,0,,
1.00,8/29/2005 0:00:00,ORLEANS,TYPHOON,0,0,1,K,0,,
";
    fs::write(&dataset, format!("{HEADER}{body}")).unwrap();

    let outcome = pipeline::run(&config_for(dir.path(), &dataset)).unwrap();
    let hurricane = outcome.aggregates.get("HURRICANE (TYPHOON)").unwrap();
    assert_eq!(hurricane.records, 2);
    assert_eq!(hurricane.property_damage.dollars(), 1_125_000.0);
    assert_eq!(outcome.aggregates.get("HURRICANE/TYPHOON").unwrap().records, 1);
    assert_eq!(outcome.aggregates.len(), 2);
}
