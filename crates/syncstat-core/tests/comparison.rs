use polars::prelude::*;

use syncstat_core::comparison::{
    classify, compare_summaries, format_delta, policy, row_deltas, Classification, Direction,
};
use syncstat_core::config::PipelineConfig;
use syncstat_core::enrichment::enrich;
use syncstat_core::summary::{summarize, MetricKey, Stat, SyncSummary, TransactionKind};
use syncstat_core::Result;
use syncstat_parser::schema::{BLOCK_HEIGHT, SYNC_IN_PROGRESS_TIME_S};

fn summary_of(df: &DataFrame) -> Result<SyncSummary> {
    let config = PipelineConfig::default();
    let enriched = enrich(df, "frame.csv", &config)?;
    summarize(&enriched.df, &config)
}

#[test]
fn higher_is_better_marks_increase_as_improvement() {
    assert_eq!(
        classify(Some(Direction::HigherIsBetter), 10.0, 15.0),
        Classification::Improvement
    );
    assert_eq!(
        classify(Some(Direction::LowerIsBetter), 10.0, 15.0),
        Classification::Regression
    );
    assert_eq!(format_delta(&MetricKey::Speed(Stat::Mean), 15.0 - 10.0), "+5.00");
}

#[test]
fn closer_to_zero_compares_magnitudes() {
    let direction = Some(Direction::CloserToZero);
    assert_eq!(classify(direction, -2.0, 1.0), Classification::Improvement);
    assert_eq!(classify(direction, 0.5, -1.5), Classification::Regression);
    assert_eq!(classify(direction, -1.0, 1.0), Classification::Neutral);
}

#[test]
fn equal_values_and_unknown_policies_are_neutral() {
    assert_eq!(
        classify(Some(Direction::HigherIsBetter), 3.0, 3.0),
        Classification::Neutral
    );
    assert_eq!(classify(None, 3.0, 4.0), Classification::Neutral);
}

#[test]
fn policy_table_matches_metric_meaning() {
    assert_eq!(policy(&MetricKey::TotalSyncTime), Some(Direction::LowerIsBetter));
    assert_eq!(policy(&MetricKey::TotalBlocks), Some(Direction::HigherIsBetter));
    assert_eq!(policy(&MetricKey::Speed(Stat::Q3)), Some(Direction::HigherIsBetter));
    assert_eq!(policy(&MetricKey::Speed(Stat::Std)), Some(Direction::LowerIsBetter));
    assert_eq!(policy(&MetricKey::Speed(Stat::Skew)), Some(Direction::CloserToZero));
    assert_eq!(
        policy(&MetricKey::Stage {
            column: "Validation_time[ms]".to_string(),
            stat: Stat::Max,
        }),
        Some(Direction::LowerIsBetter)
    );
    assert_eq!(
        policy(&MetricKey::TransactionsPerBlock(TransactionKind::User, Stat::Mean)),
        None
    );
}

#[test]
fn time_and_count_deltas_use_their_own_formats() {
    assert_eq!(format_delta(&MetricKey::TotalSyncTime, -90_061.0), "-1 day, 1:01:01 (-90061s)");
    assert_eq!(format_delta(&MetricKey::TotalBlocks, 12_500.0), "+12,500");
    assert_eq!(format_delta(&MetricKey::TotalAts, -3.0), "-3");
}

#[test]
fn deltas_cover_exactly_the_shared_metrics() -> Result<()> {
    let with_stage = df!(
        BLOCK_HEIGHT => &[0i64, 10, 20, 30],
        SYNC_IN_PROGRESS_TIME_S => &[0i64, 2, 3, 5],
        "Push_block_time[ms]" => &[5i64, 7, 9, 11],
    )?;
    let without_stage = df!(
        BLOCK_HEIGHT => &[0i64, 10, 20, 30],
        SYNC_IN_PROGRESS_TIME_S => &[0i64, 1, 2, 3],
    )?;

    let original = summary_of(&with_stage)?;
    let comparison = summary_of(&without_stage)?;
    let deltas = compare_summaries(&original, &comparison);

    assert_eq!(original.len(), 20);
    assert_eq!(comparison.len(), 15);
    assert_eq!(deltas.len(), 15);
    assert!(deltas
        .iter()
        .all(|delta| !matches!(delta.metric, MetricKey::Stage { .. })));

    let time = deltas
        .iter()
        .find(|delta| delta.metric == MetricKey::TotalSyncTime)
        .expect("total time delta");
    assert_eq!(time.delta, -2.0);
    assert_eq!(time.display, "-0:00:02 (-2s)");
    assert_eq!(time.classification, Classification::Improvement);

    let average = deltas
        .iter()
        .find(|delta| delta.metric == MetricKey::AverageSpeed)
        .expect("average speed delta");
    assert_eq!(average.delta, 10.0 - 6.0);
    assert_eq!(average.classification, Classification::Improvement);
    Ok(())
}

#[test]
fn unavailable_values_produce_no_delta() -> Result<()> {
    let short = df!(
        BLOCK_HEIGHT => &[0i64],
        SYNC_IN_PROGRESS_TIME_S => &[0i64],
    )?;
    let full = df!(
        BLOCK_HEIGHT => &[0i64, 10],
        SYNC_IN_PROGRESS_TIME_S => &[0i64, 1],
    )?;

    let deltas = compare_summaries(&summary_of(&short)?, &summary_of(&full)?);
    assert!(deltas.is_empty());
    Ok(())
}

#[test]
fn rows_align_on_shared_heights() -> Result<()> {
    let config = PipelineConfig::default();
    let original = enrich(
        &df!(
            BLOCK_HEIGHT => &[0i64, 10, 20],
            SYNC_IN_PROGRESS_TIME_S => &[0i64, 1, 2],
        )?,
        "original.csv",
        &config,
    )?;
    let comparison = enrich(
        &df!(
            BLOCK_HEIGHT => &[10i64, 20, 30],
            SYNC_IN_PROGRESS_TIME_S => &[0i64, 2, 3],
        )?,
        "comparison.csv",
        &config,
    )?;

    let rows = row_deltas(&original.df, &comparison.df)?;
    let heights: Vec<i64> = rows.iter().map(|row| row.block_height).collect();
    assert_eq!(heights, vec![10, 20]);

    assert_eq!(rows[0].sync_time_delta(), Some(-1.0));
    assert_eq!(rows[0].sync_time, Classification::Improvement);
    assert_eq!(rows[0].speed_delta(), Some(-10.0));
    assert_eq!(rows[0].speed, Classification::Regression);

    assert_eq!(rows[1].sync_time, Classification::Neutral);
    assert_eq!(rows[1].speed, Classification::Regression);
    Ok(())
}

#[test]
fn rows_need_enriched_frames() -> Result<()> {
    let raw = df!(
        BLOCK_HEIGHT => &[0i64, 10],
        SYNC_IN_PROGRESS_TIME_S => &[0i64, 1],
    )?;
    assert!(row_deltas(&raw, &raw).is_err());
    Ok(())
}
