use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use syncstat_core::config::MovingAverageWindow;
use syncstat_core::enrichment::{TimeSource, BLOCKS_PER_SECOND};
use syncstat_core::moving_average::moving_average_column;
use syncstat_core::persistence::{save_log, Reduction, SaveOptions};
use syncstat_core::summary::MetricKey;
use syncstat_core::{
    analyze, compare_logs, load_log, Classification, HeightRange, PipelineConfig, PipelineError,
    Result,
};
use syncstat_parser::SaveMode;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../syncstat-parser/tests/data")
        .join(name)
}

fn stamp() -> chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 3, 4)
        .unwrap()
        .and_hms_opt(5, 6, 7)
        .unwrap()
}

#[test]
fn missing_file_is_an_io_error() {
    let err = load_log(Path::new("/definitely/not/here/sync_progress.csv")).unwrap_err();
    assert!(matches!(err, PipelineError::Io(_)));
}

#[test]
fn malformed_file_names_missing_columns() -> Result<()> {
    let err = load_log(&fixture_path("missing_time.csv")).unwrap_err();
    let message = err.to_string();
    assert!(matches!(err, PipelineError::Parser(_)));
    assert!(message.contains("Accumulated_sync_in_progress_time[s/ms]"));
    Ok(())
}

#[test]
fn analysis_filters_before_computing_speed() -> Result<()> {
    let log = load_log(&fixture_path("sync_measurement.csv"))?;
    let range = HeightRange::new(Some(10), Some(30))?;
    let analysis = analyze(&log, &PipelineConfig::default(), &range)?;

    assert_eq!(analysis.source_name, "sync_measurement.csv");
    assert_eq!(analysis.time_source, Some(TimeSource::InProgressMillis));
    assert_eq!(analysis.enriched.height(), 3);
    assert_eq!(analysis.summary.rows, 3);

    let speed: Vec<Option<f64>> = analysis
        .enriched
        .column(BLOCKS_PER_SECOND)?
        .f64()?
        .into_iter()
        .collect();
    assert_eq!(speed, vec![Some(0.0), Some(5.0), Some(10.0)]);

    let blocks = analysis.summary.get(&MetricKey::TotalBlocks).unwrap();
    assert_eq!(blocks.raw, Some(20.0));
    let average = analysis.summary.get(&MetricKey::AverageSpeed).unwrap();
    assert_eq!(average.display, "6.67");
    Ok(())
}

#[test]
fn analysis_adds_moving_averages() -> Result<()> {
    let log = load_log(&fixture_path("sync_measurement.csv"))?;
    let config = PipelineConfig {
        moving_average_window: MovingAverageWindow::new(10)?,
        ..PipelineConfig::default()
    };
    let analysis = analyze(&log, &config, &HeightRange::full())?;

    let smoothed: Vec<Option<f64>> = analysis
        .enriched
        .column(&moving_average_column(BLOCKS_PER_SECOND))?
        .f64()?
        .into_iter()
        .collect();
    assert_eq!(smoothed, vec![Some(0.0), Some(5.0), Some(5.0), Some(6.25), Some(5.0)]);
    assert!(analysis
        .enriched
        .column(&moving_average_column("Push_block_time[ms]"))
        .is_ok());
    Ok(())
}

#[test]
fn inverted_range_is_rejected() {
    assert!(matches!(
        HeightRange::new(Some(30), Some(10)),
        Err(PipelineError::Validation(_))
    ));
}

#[test]
fn comparing_a_log_with_itself_is_neutral() -> Result<()> {
    let log = load_log(&fixture_path("sync_measurement.csv"))?;
    let comparison = compare_logs(&log, &log, &PipelineConfig::default(), &HeightRange::full())?;

    assert_eq!(comparison.deltas.len(), comparison.original.summary.len());
    assert!(comparison
        .deltas
        .iter()
        .all(|delta| delta.classification == Classification::Neutral));
    assert_eq!(comparison.rows.len(), 5);
    Ok(())
}

#[test]
fn progress_and_measurement_logs_compare_on_shared_metrics() -> Result<()> {
    let progress = load_log(&fixture_path("sync_progress.csv"))?;
    let measurement = load_log(&fixture_path("sync_measurement.csv"))?;
    let comparison = compare_logs(
        &progress,
        &measurement,
        &PipelineConfig::default(),
        &HeightRange::full(),
    )?;

    // the progress log has no transaction or stage columns
    assert_eq!(comparison.deltas.len(), 15);
    let blocks = comparison
        .deltas
        .iter()
        .find(|delta| delta.metric == MetricKey::TotalBlocks)
        .unwrap();
    assert_eq!(blocks.display, "-14,960");
    assert_eq!(blocks.classification, Classification::Regression);
    // no heights in common besides genesis
    assert_eq!(comparison.rows.len(), 1);
    Ok(())
}

#[test]
fn config_rejects_unknown_window() {
    assert!(PipelineConfig::from_toml_str("moving_average_window = 50\n").is_err());

    let config = PipelineConfig::from_toml_str(
        "moving_average_window = 200\nlegacy_total_time_fallback = false\ngenesis = \"2014-08-11T02:00:00Z\"\n",
    )
    .unwrap();
    assert_eq!(config.moving_average_window.size(), 200);
    assert!(!config.legacy_total_time_fallback);
    assert_eq!(config.genesis, PipelineConfig::default().genesis);
    assert_eq!(config.chunk_size, 5000);
}

#[test]
fn saving_twice_never_overwrites() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let log = load_log(&fixture_path("sync_measurement.csv"))?;

    let mut options = SaveOptions::new(dir.path(), stamp());
    options.range = HeightRange::new(Some(10), Some(30))?;
    options.set_metadata = vec![("Note".to_string(), "rerun".to_string())];
    options.remove_metadata = vec!["OS Name".to_string()];

    let first = save_log(&log, &options)?;
    let second = save_log(&log, &options)?;

    assert_eq!(
        first.file_name().and_then(|n| n.to_str()),
        Some("sync_measurement_range_10-30_hostname_node-01.example_20250304_050607.csv")
    );
    assert_eq!(
        second.file_name().and_then(|n| n.to_str()),
        Some("sync_measurement_range_10-30_hostname_node-01.example_20250304_050607_1.csv")
    );

    let saved = load_log(&first)?;
    assert_eq!(saved.height(), 3);
    assert_eq!(saved.metadata.get("Note"), Some("rerun"));
    assert_eq!(saved.metadata.get("OS Name"), None);
    assert_eq!(saved.metadata.hostname(), Some("node-01.example"));
    Ok(())
}

#[test]
fn overwrite_reuses_the_base_name() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let log = load_log(&fixture_path("sync_progress.csv"))?;

    let mut options = SaveOptions::new(dir.path(), stamp());
    options.mode = SaveMode::Overwrite;
    options.reduction = Some(Reduction::Thin { interval: 10000 });

    let path = save_log(&log, &options)?;
    assert_eq!(path, dir.path().join("sync_progress.csv"));
    let again = save_log(&log, &options)?;
    assert_eq!(again, path);

    let content = fs::read_to_string(&path)?;
    assert!(!content.starts_with("Property;Value"));
    let saved = load_log(&path)?;
    assert_eq!(saved.height(), 2);
    Ok(())
}
