//! Integration tests for the listings analysis pipeline.
//!
//! These tests run the pipeline end to end on small listing files.

use autos_analysis::reporting::{DisplayOptions, ReportFormatter, ReportWriter};
use autos_analysis::schema::normalize_table;
use autos_analysis::{
    AggregateSort, AggregateSortKey, AnalysisConfig, AnalysisOutcome, AnalysisStage,
    ColumnDropMode, CsvLoader, Pipeline, load_table,
};
use polars::prelude::*;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn run_with(config: AnalysisConfig, filename: &str) -> AnalysisOutcome {
    Pipeline::builder()
        .config(config)
        .build()
        .unwrap()
        .run(fixtures_path().join(filename))
        .unwrap()
}

fn run_sample() -> AnalysisOutcome {
    run_with(AnalysisConfig::default(), "autos_sample.csv")
}

fn numeric_values(df: &DataFrame, column: &str) -> Vec<f64> {
    df.column(column)
        .unwrap()
        .as_materialized_series()
        .cast(&DataType::Float64)
        .unwrap()
        .f64()
        .unwrap()
        .into_iter()
        .flatten()
        .collect()
}

fn assert_close(actual: Option<f64>, expected: f64) {
    let actual = actual.expect("value should be present");
    assert!(
        (actual - expected).abs() < 1e-6,
        "expected {}, got {}",
        expected,
        actual
    );
}

// ============================================================================
// Full Pipeline Tests
// ============================================================================

#[test]
fn test_full_pipeline_sample() {
    let outcome = run_sample();
    let report = &outcome.report;

    assert_eq!(report.rows_loaded, 16);
    assert_eq!(report.columns_loaded, 20);
    assert_eq!(report.encoding, "ISO-8859-1");
    assert_eq!(report.replaced_characters, 0);

    let price = &report.price.filter;
    assert_eq!(price.rows_before, 16);
    assert_eq!(price.removed_below, 1);
    assert_eq!(price.removed_above, 1);
    assert_eq!(price.removed_missing, 1);
    assert_eq!(price.rows_after, 13);

    let year = &report.registration_year.filter;
    assert_eq!(year.rows_before, 13);
    assert_eq!(year.removed_below, 1);
    assert_eq!(year.removed_above, 1);
    assert_eq!(year.rows_after, 11);

    assert_eq!(outcome.cleaned.height(), 11);
    assert_eq!(report.summary.rows_final, 11);
    assert_eq!(report.summary.rows_removed(), 5);
}

#[test]
fn test_cleaned_table_respects_ranges() {
    let outcome = run_sample();

    let prices = numeric_values(&outcome.cleaned, "price");
    assert_eq!(prices.len(), outcome.cleaned.height());
    assert!(prices.iter().all(|p| *p > 0.0 && *p < 500_000.0));

    let years = numeric_values(&outcome.cleaned, "registration_year");
    assert!(years.iter().all(|y| (1900.0..=2017.0).contains(y)));
}

#[test]
fn test_high_row_loss_warning() {
    // 5 of 16 rows removed
    let outcome = run_sample();
    assert!(
        outcome
            .report
            .summary
            .warnings
            .iter()
            .any(|w| w.contains("High data loss"))
    );
}

#[test]
fn test_progress_covers_loading() {
    let stages = Arc::new(Mutex::new(Vec::new()));
    let stages_clone = stages.clone();

    Pipeline::builder()
        .on_progress(move |update| {
            if let Ok(mut s) = stages_clone.lock() {
                s.push((update.stage, update.progress));
            }
        })
        .build()
        .unwrap()
        .run(fixtures_path().join("autos_sample.csv"))
        .unwrap();

    let seen = stages.lock().unwrap().clone();
    assert_eq!(seen.first().map(|(s, _)| *s), Some(AnalysisStage::Loading));
    assert_eq!(seen.last().map(|(s, _)| *s), Some(AnalysisStage::Complete));
    assert!(seen.windows(2).all(|w| w[0].1 <= w[1].1));
}

// ============================================================================
// Schema Normalization Tests
// ============================================================================

#[test]
fn test_column_names_normalized() {
    let outcome = run_sample();
    let names: Vec<String> = outcome
        .cleaned
        .get_column_names()
        .into_iter()
        .map(|s| s.to_string())
        .collect();

    for expected in [
        "date_crawled",
        "registration_year",
        "registration_month",
        "vehicle_type",
        "odometer_km",
        "power_ps",
        "ab_test",
        "fuel_type",
        "unrepaired_damage",
        "ad_created",
        "num_photos",
        "postal_code",
        "last_seen",
    ] {
        assert!(names.iter().any(|n| n == expected), "missing {}", expected);
    }
    assert!(!names.iter().any(|n| n == "kilometer"));

    let clarity = &outcome.report.schema.clarity_renames;
    assert_eq!(clarity.len(), 1);
    assert_eq!(clarity[0].original, "kilometer");
    assert_eq!(clarity[0].normalized, "odometer_km");

    // The initial summary is taken before the clarity rename
    let summary = &outcome.report.initial_summary;
    assert!(summary.iter().any(|s| s.column == "kilometer"));
    assert!(!summary.iter().any(|s| s.column == "odometer_km"));
}

#[test]
fn test_normalization_is_idempotent() {
    let raw = load_table(fixtures_path().join("autos_sample.csv"), "latin1").unwrap();
    let (once, first) = normalize_table(&raw).unwrap();
    let (_, second) = normalize_table(&once).unwrap();

    assert!(first.iter().any(|r| r.is_changed()));
    assert!(second.iter().all(|r| !r.is_changed()));
}

// ============================================================================
// Column Drop Tests
// ============================================================================

#[test]
fn test_advisory_drop_keeps_columns() {
    let outcome = run_sample();
    let dropped = &outcome.report.dropped_columns;

    assert_eq!(dropped.outcome.mode, ColumnDropMode::Advisory);
    assert_eq!(dropped.outcome.dropped, vec!["seller", "offer_type", "num_photos"]);
    assert!(dropped.outcome.missing.is_empty());
    assert!(outcome.cleaned.column("seller").is_ok());

    let seller = dropped
        .evidence
        .iter()
        .find(|t| t.column == "seller")
        .unwrap();
    assert_eq!(seller.get("privat").map(|e| e.count), Some(15));
    assert_eq!(seller.get("gewerblich").map(|e| e.count), Some(1));
}

#[test]
fn test_remove_drop_mode() {
    let config = AnalysisConfig::builder()
        .drop_mode(ColumnDropMode::Remove)
        .build()
        .unwrap();
    let outcome = run_with(config, "autos_sample.csv");

    for column in ["seller", "offer_type", "num_photos"] {
        assert!(outcome.cleaned.column(column).is_err());
    }
    assert_eq!(outcome.cleaned.width(), 17);
    assert_eq!(outcome.cleaned.height(), 11);
}

// ============================================================================
// Exploration and Date Tests
// ============================================================================

#[test]
fn test_price_exploration_before_and_after() {
    let outcome = run_sample();
    let price = &outcome.report.price;

    assert_eq!(price.before.summary.count, 15);
    assert_eq!(price.before.summary.missing, 1);
    assert_eq!(
        price.before.highest_values.entries.first().map(|e| e.value.as_str()),
        Some("999999")
    );
    assert_eq!(
        price.after.highest_values.entries.first().map(|e| e.value.as_str()),
        Some("18300")
    );
}

#[test]
fn test_odometer_exploration() {
    let outcome = run_sample();
    let odometer = &outcome.report.odometer;

    assert_eq!(odometer.column, "odometer_km");
    assert_eq!(odometer.distinct, 6);
    let top = odometer.most_frequent.most_frequent().unwrap();
    assert_eq!(top.value, "150000");
    assert_eq!(top.count, 9);
}

#[test]
fn test_date_distributions() {
    let outcome = run_sample();
    let dates = &outcome.report.date_distributions;
    assert_eq!(dates.len(), 3);

    let crawled = dates.iter().find(|d| d.column == "date_crawled").unwrap();
    assert_eq!(crawled.unparsed, 0);
    assert_eq!(crawled.earliest.map(|d| d.to_string()).as_deref(), Some("2016-03-08"));
    assert_eq!(crawled.latest.map(|d| d.to_string()).as_deref(), Some("2016-04-04"));

    let mode = crawled.by_frequency.most_frequent().unwrap();
    assert_eq!(mode.value, "2016-03-24");
    assert_eq!(mode.count, 2);

    let first_day = crawled.by_date.entries.first().unwrap();
    assert_eq!(first_day.value, "2016-03-08");
}

#[test]
fn test_missing_date_column_becomes_warning() {
    let config = AnalysisConfig::builder()
        .date_columns(["date_crawled", "date_sold"])
        .build()
        .unwrap();
    let outcome = run_with(config, "autos_sample.csv");

    assert_eq!(outcome.report.date_distributions.len(), 1);
    assert!(
        outcome
            .report
            .summary
            .warnings
            .iter()
            .any(|w| w.contains("'date_sold'"))
    );
}

// ============================================================================
// Brand Aggregation Tests
// ============================================================================

#[test]
fn test_brand_aggregates_match_manual_means() {
    let outcome = run_sample();
    let brands = &outcome.report.brands;

    assert_eq!(brands.shares.distinct(), 7);
    let order: Vec<&str> = brands
        .aggregates
        .rows
        .iter()
        .take(3)
        .map(|r| r.brand.as_str())
        .collect();
    assert_eq!(order, vec!["volkswagen", "audi", "bmw"]);

    let vw = brands.aggregates.get("volkswagen").unwrap();
    assert_eq!(vw.listings, 3);
    assert_close(vw.mean_price, (480.0 + 1500.0 + 4200.0) / 3.0);
    assert_close(vw.mean_mileage_km, (150_000.0 + 150_000.0 + 125_000.0) / 3.0);

    let audi = brands.aggregates.get("audi").unwrap();
    assert_close(audi.mean_price, 11_650.0);
    assert_close(audi.mean_mileage_km, 137_500.0);

    let bmw = brands.aggregates.get("bmw").unwrap();
    assert_close(bmw.mean_price, 6_175.0);
    assert_close(bmw.mean_mileage_km, 150_000.0);

    // Filtered out entirely
    assert!(brands.aggregates.get("opel").is_none());
    assert!(brands.aggregates.get("mercedes_benz").is_none());
}

#[test]
fn test_top_brands_and_sort_config() {
    let config = AnalysisConfig::builder()
        .top_brands(3)
        .aggregate_sort(AggregateSort::descending(AggregateSortKey::MeanPrice))
        .build()
        .unwrap();
    let outcome = run_with(config, "autos_sample.csv");

    let order: Vec<&str> = outcome
        .report
        .brands
        .aggregates
        .rows
        .iter()
        .map(|r| r.brand.as_str())
        .collect();
    assert_eq!(order, vec!["audi", "bmw", "volkswagen"]);
}

#[test]
fn test_aggregate_dataframe_export() {
    let outcome = run_sample();
    let df = outcome.report.brands.aggregates.to_dataframe().unwrap();

    assert_eq!(df.height(), 7);
    assert_eq!(df.width(), 3);
    assert!(df.column("mean_mileage_km").is_ok());
}

// ============================================================================
// Encoding Tests
// ============================================================================

#[test]
fn test_latin1_fixture_decodes() {
    let df = load_table(fixtures_path().join("autos_latin1.csv"), "latin1").unwrap();
    let names: Vec<String> = df
        .column("name")
        .unwrap()
        .str()
        .unwrap()
        .into_iter()
        .flatten()
        .map(|s| s.to_string())
        .collect();

    assert!(names.iter().any(|n| n == "VW_Käfer_Cabrio"));
    assert!(names.iter().any(|n| n == "Citroën_C3_Pluriel"));
    assert!(names.iter().any(|n| n == "Schöner_Golf_2"));
}

#[test]
fn test_latin1_read_as_utf8_counts_replacements() {
    let loaded = CsvLoader::new("utf-8")
        .unwrap()
        .load(fixtures_path().join("autos_latin1.csv"))
        .unwrap();

    assert_eq!(loaded.encoding, "UTF-8");
    assert_eq!(loaded.replaced_characters, 3);
    assert_eq!(loaded.data.height(), 3);
}

#[test]
fn test_latin1_pipeline() {
    let outcome = run_with(AnalysisConfig::default(), "autos_latin1.csv");

    assert_eq!(outcome.report.summary.rows_final, 3);
    let vw = outcome.report.brands.aggregates.get("volkswagen").unwrap();
    assert_close(vw.mean_price, (12_500.0 + 1_350.0) / 2.0);
    assert!(outcome.report.summary.warnings.iter().all(|w| !w.contains("decoded")));
}

// ============================================================================
// Error Handling Tests
// ============================================================================

#[test]
fn test_missing_file() {
    let err = Pipeline::builder()
        .build()
        .unwrap()
        .run(fixtures_path().join("does_not_exist.csv"))
        .unwrap_err();
    assert_eq!(err.error_code(), "FILE_NOT_FOUND");
}

#[test]
fn test_unknown_encoding() {
    let config = AnalysisConfig::builder().encoding("klingon").build().unwrap();
    let err = Pipeline::builder()
        .config(config)
        .build()
        .unwrap()
        .run(fixtures_path().join("autos_sample.csv"))
        .unwrap_err();
    assert_eq!(err.error_code(), "UNKNOWN_ENCODING");
}

#[test]
fn test_empty_file() {
    let err = Pipeline::builder()
        .build()
        .unwrap()
        .run(fixtures_path().join("empty.csv"))
        .unwrap_err();
    assert_eq!(err.error_code(), "LOAD_ERROR");
}

#[test]
fn test_missing_required_column() {
    let df = df!(
        "price" => &[1000i64, 2000],
        "yearOfRegistration" => &[2004i64, 2005],
        "kilometer" => &[150_000i64, 90_000],
    )
    .unwrap();

    let err = Pipeline::builder()
        .build()
        .unwrap()
        .analyze(&df, "memory")
        .unwrap_err();
    assert_eq!(err.error_code(), "COLUMN_NOT_FOUND");
    assert!(err.to_string().contains("brand"));
}

// ============================================================================
// Reporting Tests
// ============================================================================

#[test]
fn test_text_report_renders_all_sections() {
    let outcome = run_sample();
    let text = ReportFormatter::render(&outcome.report, &DisplayOptions::default());

    for header in [
        "COLUMN NAMES",
        "COLUMN SUMMARY",
        "LOW-VALUE COLUMNS",
        "ODOMETER",
        "PRICE",
        "REGISTRATION YEAR",
        "DATES",
        "BRANDS",
        "SUMMARY",
    ] {
        assert!(text.contains(header), "missing section {}", header);
    }
    assert!(text.contains("volkswagen"));
    assert!(text.contains("2060.00"));
    assert!(text.contains("11650.00"));

    // date_crawled is the first date column: count order, then calendar order
    let lines: Vec<&str> = text.lines().collect();
    let dates = lines.iter().position(|l| *l == "DATES").unwrap();
    let find = |title: &str| dates + lines[dates..].iter().position(|l| *l == title).unwrap();
    let most_frequent = find("Most frequent");
    let by_date = find("By date");
    assert!(most_frequent < by_date);
    assert!(lines[most_frequent + 3].starts_with("2016-03-24"));
    assert!(lines[by_date + 3].starts_with("2016-03-08"));
}

#[test]
fn test_json_report_written() {
    let outcome = run_sample();
    let dir = std::env::temp_dir().join(format!("autos-analysis-it-{}", std::process::id()));

    let writer = ReportWriter::new(&dir);
    let path = writer
        .write(&outcome.report, &fixtures_path().join("autos_sample.csv"))
        .unwrap();
    assert_eq!(
        path.file_name().and_then(|n| n.to_str()),
        Some("autos_sample_report.json")
    );

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(json["rows_loaded"], 16);
    assert_eq!(json["summary"]["rows_final"], 11);
    assert_eq!(json["brands"]["aggregates"]["rows"][0]["brand"], "volkswagen");

    std::fs::remove_dir_all(&dir).ok();
}
