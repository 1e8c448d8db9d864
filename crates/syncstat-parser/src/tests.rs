use std::fs;
use std::path::PathBuf;

use polars::prelude::*;

use crate::errors::ParserError;
use crate::formats::{SyncMeasurementParser, SyncProgressParser};
use crate::model::{LogFormat, LogMetadata};
use crate::registry::{parse_with_parsers, SyncLogParser};
use crate::schema::{StageTiming, BLOCK_HEIGHT, CUMULATIVE_DIFFICULTY, SYNC_IN_PROGRESS_TIME_S};
use crate::{parse_sync_log, render_sync_log};

fn fixture(path: &str) -> String {
    let base = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let full_path = base.join("tests/data").join(path);
    fs::read_to_string(&full_path)
        .unwrap_or_else(|err| panic!("failed to read fixture {}: {}", full_path.display(), err))
}

#[test]
fn parses_sync_progress_without_preamble() {
    let content = fixture("sync_progress.csv");
    let log = parse_sync_log("sync_progress.csv", &content).expect("sync_progress parse failed");

    assert_eq!(log.format, LogFormat::SyncProgress);
    assert_eq!(log.source_name, "sync_progress.csv");
    assert!(log.metadata.is_empty());
    assert_eq!(log.height(), 4);

    let heights = log.df.column(BLOCK_HEIGHT).unwrap().i64().unwrap();
    assert_eq!(heights.get(0), Some(0));
    assert_eq!(heights.get(3), Some(15000));

    let time = log.df.column(SYNC_IN_PROGRESS_TIME_S).unwrap().i64().unwrap();
    assert_eq!(time.get(3), Some(170));
}

#[test]
fn cumulative_difficulty_stays_textual() {
    let content = fixture("sync_progress.csv");
    let log = parse_sync_log("sync_progress.csv", &content).unwrap();

    let difficulty = log.df.column(CUMULATIVE_DIFFICULTY).unwrap();
    assert_eq!(difficulty.dtype(), &DataType::String);
    assert_eq!(
        difficulty.str().unwrap().get(1),
        Some("938472938472938472938472")
    );
}

#[test]
fn parses_measurement_with_metadata_and_stages() {
    let content = fixture("sync_measurement.csv");
    let log = parse_sync_log("sync_measurement.csv", &content).expect("measurement parse failed");

    assert_eq!(log.format, LogFormat::SyncMeasurement);
    assert_eq!(log.height(), 5);
    assert_eq!(log.metadata.len(), 4);
    assert_eq!(log.metadata.hostname(), Some("node-01.example"));
    assert_eq!(log.metadata.get("Signum Version"), Some("v3.8.4"));

    let keys: Vec<&str> = log.metadata.iter().map(|(k, _)| k).collect();
    assert_eq!(
        keys,
        vec!["Signum Version", "Hostname", "OS Name", "Available Processors"]
    );

    for stage in StageTiming::all() {
        assert!(
            log.has_column(stage.canonical_name()),
            "missing stage column {}",
            stage.canonical_name()
        );
    }

    let housekeeping = log
        .df
        .column(StageTiming::Housekeeping.canonical_name())
        .unwrap()
        .i64()
        .unwrap();
    assert_eq!(housekeeping.get(3), Some(2));
    assert_eq!(housekeeping.get(4), None);
}

#[test]
fn legacy_measurement_is_detected_last() {
    let content = fixture("sync_measurement_legacy.csv");
    let log = parse_sync_log("legacy.csv", &content).expect("legacy parse failed");

    assert_eq!(log.format, LogFormat::LegacyMeasurement);
    assert_eq!(log.format.time_column(), "Accumulated_sync_time[ms]");
    assert_eq!(log.height(), 3);
    assert!(log.has_column("Transaction_count"));
}

#[test]
fn missing_time_column_is_reported() {
    let content = fixture("missing_time.csv");
    let err = parse_sync_log("missing_time.csv", &content).unwrap_err();

    match err {
        ParserError::UnrecognizedLog { missing, attempts } => {
            assert_eq!(missing, vec!["Accumulated_sync_in_progress_time[s/ms]"]);
            let parsers: Vec<&str> = attempts.iter().map(|a| a.parser).collect();
            assert_eq!(
                parsers,
                vec!["SYNC_PROGRESS", "SYNC_MEASUREMENT", "SYNC_MEASUREMENT_LEGACY"]
            );
        }
        other => panic!("expected unrecognized log, got {other:?}"),
    }
}

#[test]
fn missing_block_height_is_reported() {
    let content = "Block_timestamp;Accumulated_sync_in_progress_time[s];x\n0;0;1\n";
    let err = parse_sync_log("broken.csv", content).unwrap_err();

    match err {
        ParserError::MissingColumns { parser, columns } => {
            assert_eq!(parser, "SYNC_PROGRESS");
            assert_eq!(columns, vec![BLOCK_HEIGHT.to_string()]);
        }
        other => panic!("expected missing columns, got {other:?}"),
    }
}

#[test]
fn header_without_rows_is_empty() {
    let content = fixture("header_only.csv");
    let err = parse_sync_log("header_only.csv", &content).unwrap_err();
    assert!(matches!(err, ParserError::EmptyData { .. }));
}

#[test]
fn ragged_row_reports_line() {
    let content = fixture("ragged_row.csv");
    let err = parse_sync_log("ragged_row.csv", &content).unwrap_err();

    match err {
        ParserError::RaggedRow {
            line_index,
            expected,
            found,
            ..
        } => {
            assert_eq!(line_index, 3);
            assert_eq!(found, expected + 1);
        }
        other => panic!("expected data row error, got {other:?}"),
    }
}

#[test]
fn duplicate_header_column_is_rejected() {
    let content = "Block_height;Accumulated_sync_in_progress_time[s];Block_height\n0;0;0\n";
    let err = parse_sync_log("dup.csv", content).unwrap_err();
    match err {
        ParserError::DuplicateColumn {
            row_index, column, ..
        } => {
            assert_eq!(row_index, 0);
            assert_eq!(column, BLOCK_HEIGHT);
        }
        other => panic!("expected duplicate column, got {other:?}"),
    }
}

#[test]
fn registry_collects_attempts_when_nothing_matches() {
    let content = fixture("missing_time.csv");
    let progress = SyncProgressParser;
    let measurement = SyncMeasurementParser;
    let parsers: [&dyn SyncLogParser; 2] = [&progress, &measurement];

    match parse_with_parsers(&content, &parsers).unwrap_err() {
        ParserError::NoMatchingParser { attempts } => {
            let names: Vec<&str> = attempts.iter().map(|a| a.parser).collect();
            assert_eq!(names, vec!["SYNC_PROGRESS", "SYNC_MEASUREMENT"]);
        }
        other => panic!("expected no matching parser, got {other:?}"),
    }
}

#[test]
fn file_hash_tracks_content() {
    let content = fixture("sync_progress.csv");
    let first = parse_sync_log("a.csv", &content).unwrap();
    let second = parse_sync_log("b.csv", &content).unwrap();
    let edited = parse_sync_log("a.csv", &content.replace("170", "171")).unwrap();

    assert_eq!(first.file_hash, second.file_hash);
    assert_ne!(first.file_hash, edited.file_hash);
}

#[test]
fn rendered_log_parses_back_with_metadata() {
    let content = fixture("sync_measurement.csv");
    let log = parse_sync_log("sync_measurement.csv", &content).unwrap();

    let mut metadata = log.metadata.clone();
    metadata.set("Note", "rerun");
    metadata.remove("OS Name");

    let rendered = render_sync_log(&metadata, &log.df).expect("render failed");
    assert!(rendered.starts_with("Property;Value\nSignum Version;v3.8.4\n"));
    assert!(rendered.contains("\n;;\nBlock_height;"));

    let reparsed = parse_sync_log("again.csv", &rendered).expect("rendered log did not parse");
    assert_eq!(reparsed.format, LogFormat::SyncMeasurement);
    assert_eq!(reparsed.metadata.get("Note"), Some("rerun"));
    assert_eq!(reparsed.metadata.get("OS Name"), None);
    assert_eq!(reparsed.height(), log.height());
    assert_eq!(
        reparsed.df.get_column_names(),
        log.df.get_column_names()
    );
}

#[test]
fn render_without_metadata_has_no_preamble() {
    let df = df!(
        BLOCK_HEIGHT => &[1i64, 2],
        SYNC_IN_PROGRESS_TIME_S => &[0.5f64, 1.5],
    )
    .unwrap();

    let rendered = render_sync_log(&LogMetadata::new(), &df).unwrap();
    assert_eq!(
        rendered,
        "Block_height;Accumulated_sync_in_progress_time[s]\n1;0.5\n2;1.5\n"
    );
}
