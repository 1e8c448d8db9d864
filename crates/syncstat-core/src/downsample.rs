use std::collections::BTreeMap;

use polars::prelude::*;
use syncstat_parser::schema::{
    ALL_TRANSACTION_COUNT, AT_COUNT, BLOCK_HEIGHT, TRANSACTION_COUNT, USER_TRANSACTION_COUNT,
};
use syncstat_parser::StageTiming;

use crate::error::{PipelineError, Result};
use crate::frame::{float_values, int_values, take_rows};

const SUMMED_COLUMNS: [&str; 4] = [
    ALL_TRANSACTION_COUNT,
    TRANSACTION_COUNT,
    USER_TRANSACTION_COUNT,
    AT_COUNT,
];

/// Collapses every `chunk_size` blocks into one row. Genesis rows (height 0)
/// pass through untouched; heights 1..=chunk_size form the first chunk. Each
/// chunk keeps its last row, with stage timings replaced by their mean and
/// counters by their sum. Rows without a positive height are dropped.
pub fn average_by_chunks(df: &DataFrame, chunk_size: i64) -> Result<DataFrame> {
    if chunk_size <= 0 {
        return Err(PipelineError::Validation(format!(
            "chunk size must be positive, got {chunk_size}"
        )));
    }
    let Some(heights) = int_values(df, BLOCK_HEIGHT)? else {
        return Ok(df.clone());
    };
    if df.height() == 0 {
        return Ok(df.clone());
    }

    let mut groups: Vec<Vec<usize>> = Vec::new();
    let mut chunks: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
    for (idx, height) in heights.iter().enumerate() {
        match height {
            Some(0) => groups.push(vec![idx]),
            Some(h) if *h > 0 => chunks.entry((h - 1) / chunk_size).or_default().push(idx),
            _ => {}
        }
    }
    groups.extend(chunks.into_values());

    let last_rows: Vec<usize> = groups
        .iter()
        .filter_map(|group| group.last().copied())
        .collect();
    let mut output = take_rows(df, &last_rows)?;

    for stage in StageTiming::all() {
        let column = stage.canonical_name();
        let Some(values) = float_values(df, column)? else {
            continue;
        };
        let means: Vec<Option<f64>> = groups
            .iter()
            .map(|group| {
                let present: Vec<f64> = group.iter().filter_map(|&idx| values[idx]).collect();
                if present.is_empty() {
                    None
                } else {
                    Some(present.iter().sum::<f64>() / present.len() as f64)
                }
            })
            .collect();
        output.with_column(Series::new(column.into(), means))?;
    }

    for column in SUMMED_COLUMNS {
        let Some(values) = int_values(df, column)? else {
            continue;
        };
        let sums: Vec<i64> = groups
            .iter()
            .map(|group| group.iter().filter_map(|&idx| values[idx]).sum())
            .collect();
        output.with_column(Series::new(column.into(), sums))?;
    }

    tracing::debug!(
        chunk_size,
        rows = df.height(),
        chunks = output.height(),
        "averaged log by block chunks"
    );
    Ok(output)
}

/// Keeps rows at height 0 and at multiples of `interval`, sorted by height,
/// one row per height.
pub fn thin_to_interval(df: &DataFrame, interval: i64) -> Result<DataFrame> {
    if interval <= 0 {
        return Err(PipelineError::Validation(format!(
            "thinning interval must be positive, got {interval}"
        )));
    }
    let Some(heights) = int_values(df, BLOCK_HEIGHT)? else {
        return Ok(df.clone());
    };

    let mut kept: Vec<(i64, usize)> = heights
        .iter()
        .enumerate()
        .filter_map(|(idx, height)| {
            height
                .filter(|h| *h == 0 || h % interval == 0)
                .map(|h| (h, idx))
        })
        .collect();
    kept.sort_by_key(|(height, _)| *height);
    kept.dedup_by_key(|(height, _)| *height);

    let rows: Vec<usize> = kept.into_iter().map(|(_, idx)| idx).collect();
    let output = take_rows(df, &rows)?;
    tracing::debug!(interval, rows = df.height(), kept = output.height(), "thinned log");
    Ok(output)
}
