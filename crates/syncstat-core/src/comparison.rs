use std::collections::HashMap;

use polars::prelude::*;
use serde::Serialize;
use syncstat_parser::schema::BLOCK_HEIGHT;

use crate::enrichment::{BLOCKS_PER_SECOND, SYNC_TIME_S};
use crate::error::{PipelineError, Result};
use crate::format::{format_signed_count, format_signed_duration, format_signed_fixed};
use crate::frame::{float_values, int_values};
use crate::summary::{MetricKey, MetricValue, Stat, SyncSummary, TransactionKind};

/// Which way a metric has to move for the comparison log to count as better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    HigherIsBetter,
    LowerIsBetter,
    CloserToZero,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Improvement,
    Regression,
    Neutral,
}

pub fn policy(metric: &MetricKey) -> Option<Direction> {
    use Direction::*;

    match metric {
        MetricKey::TotalSyncTime => Some(LowerIsBetter),
        MetricKey::TotalBlocks
        | MetricKey::TotalTransactions
        | MetricKey::TotalUserTransactions
        | MetricKey::TotalSystemTransactions
        | MetricKey::TotalAts
        | MetricKey::AverageSpeed => Some(HigherIsBetter),
        MetricKey::Speed(Stat::Std) => Some(LowerIsBetter),
        MetricKey::Speed(Stat::Skew) => Some(CloserToZero),
        MetricKey::Speed(_) => Some(HigherIsBetter),
        MetricKey::TransactionsPerBlock(TransactionKind::All, Stat::Std) => Some(LowerIsBetter),
        MetricKey::TransactionsPerBlock(TransactionKind::All, Stat::Skew) => None,
        MetricKey::TransactionsPerBlock(TransactionKind::All, _) => Some(HigherIsBetter),
        MetricKey::TransactionsPerBlock(_, _) => None,
        MetricKey::Stage { .. } => Some(LowerIsBetter),
    }
}

/// Judges `comparison` against `original`. Equal values, and metrics without
/// a direction, are neutral.
pub fn classify(direction: Option<Direction>, original: f64, comparison: f64) -> Classification {
    let delta = comparison - original;
    if delta == 0.0 || delta.is_nan() {
        return Classification::Neutral;
    }
    let better = match direction {
        Some(Direction::HigherIsBetter) => delta > 0.0,
        Some(Direction::LowerIsBetter) => delta < 0.0,
        Some(Direction::CloserToZero) => {
            if comparison.abs() == original.abs() {
                return Classification::Neutral;
            }
            comparison.abs() < original.abs()
        }
        None => return Classification::Neutral,
    };
    if better {
        Classification::Improvement
    } else {
        Classification::Regression
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricDelta {
    pub metric: MetricKey,
    pub original: MetricValue,
    pub comparison: MetricValue,
    /// `comparison - original`.
    pub delta: f64,
    pub display: String,
    pub direction: Option<Direction>,
    pub classification: Classification,
}

pub fn format_delta(metric: &MetricKey, delta: f64) -> String {
    if metric.is_time() {
        format_signed_duration(delta)
    } else if metric.is_count() {
        format_signed_count(delta.round() as i64)
    } else {
        format_signed_fixed(delta)
    }
}

/// One delta per metric that both summaries carry with a value, in the
/// original summary's order. Anything else is skipped.
pub fn compare_summaries(original: &SyncSummary, comparison: &SyncSummary) -> Vec<MetricDelta> {
    original
        .iter()
        .filter_map(|entry| {
            let other = comparison.get(&entry.metric)?;
            let (Some(base), Some(candidate)) = (entry.value.raw, other.raw) else {
                return None;
            };
            let delta = candidate - base;
            let direction = policy(&entry.metric);
            Some(MetricDelta {
                metric: entry.metric.clone(),
                original: entry.value.clone(),
                comparison: other.clone(),
                delta,
                display: format_delta(&entry.metric, delta),
                direction,
                classification: classify(direction, base, candidate),
            })
        })
        .collect()
}

/// Per-height comparison of two enriched logs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowDelta {
    pub block_height: i64,
    pub original_sync_time_s: Option<f64>,
    pub comparison_sync_time_s: Option<f64>,
    pub sync_time: Classification,
    pub original_speed: Option<f64>,
    pub comparison_speed: Option<f64>,
    pub speed: Classification,
}

impl RowDelta {
    pub fn sync_time_delta(&self) -> Option<f64> {
        Some(self.comparison_sync_time_s? - self.original_sync_time_s?)
    }

    pub fn speed_delta(&self) -> Option<f64> {
        Some(self.comparison_speed? - self.original_speed?)
    }
}

/// Pairs rows of two enriched frames sharing a block height, in the original's
/// row order. A height repeated in the comparison matches its first row.
pub fn row_deltas(original: &DataFrame, comparison: &DataFrame) -> Result<Vec<RowDelta>> {
    let (orig_heights, orig_time, orig_speed) = row_columns(original, "original")?;
    let (comp_heights, comp_time, comp_speed) = row_columns(comparison, "comparison")?;

    let mut comparison_rows: HashMap<i64, usize> = HashMap::new();
    for (idx, height) in comp_heights.iter().enumerate() {
        if let Some(height) = height {
            comparison_rows.entry(*height).or_insert(idx);
        }
    }

    let mut deltas = Vec::new();
    for (idx, height) in orig_heights.iter().enumerate() {
        let Some(height) = height else {
            continue;
        };
        let Some(&other) = comparison_rows.get(height) else {
            continue;
        };

        let (time_a, time_b) = (orig_time[idx], comp_time[other]);
        let (speed_a, speed_b) = (orig_speed[idx], comp_speed[other]);
        deltas.push(RowDelta {
            block_height: *height,
            original_sync_time_s: time_a,
            comparison_sync_time_s: time_b,
            sync_time: classify_pair(Direction::LowerIsBetter, time_a, time_b),
            original_speed: speed_a,
            comparison_speed: speed_b,
            speed: classify_pair(Direction::HigherIsBetter, speed_a, speed_b),
        });
    }

    tracing::debug!(
        original_rows = original.height(),
        comparison_rows = comparison.height(),
        matched = deltas.len(),
        "aligned logs on block height"
    );
    Ok(deltas)
}

fn classify_pair(direction: Direction, original: Option<f64>, comparison: Option<f64>) -> Classification {
    match (original, comparison) {
        (Some(a), Some(b)) => classify(Some(direction), a, b),
        _ => Classification::Neutral,
    }
}

#[allow(clippy::type_complexity)]
fn row_columns(
    df: &DataFrame,
    side: &str,
) -> Result<(Vec<Option<i64>>, Vec<Option<f64>>, Vec<Option<f64>>)> {
    let missing = |column: &str| {
        PipelineError::Validation(format!(
            "{side} log has no {column} column; enrich it before comparing rows"
        ))
    };
    let heights = int_values(df, BLOCK_HEIGHT)?.ok_or_else(|| missing(BLOCK_HEIGHT))?;
    let time = float_values(df, SYNC_TIME_S)?.ok_or_else(|| missing(SYNC_TIME_S))?;
    let speed = float_values(df, BLOCKS_PER_SECOND)?.ok_or_else(|| missing(BLOCKS_PER_SECOND))?;
    Ok((heights, time, speed))
}
