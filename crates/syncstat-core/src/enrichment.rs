use chrono::{DateTime, TimeDelta, Utc};
use polars::prelude::*;
use serde::Serialize;
use syncstat_parser::schema::{
    BLOCK_HEIGHT, BLOCK_TIMESTAMP, SYNC_IN_PROGRESS_TIME_MS, SYNC_IN_PROGRESS_TIME_S, SYNC_TIME_MS,
    TRANSACTION_COUNT_ALIASES,
};
use syncstat_parser::StageTiming;

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::format::format_optional_seconds;
use crate::frame::{first_present, float_values};

pub const SYNC_TIME_S: &str = "sync_time_s";
pub const BLOCKS_PER_SECOND: &str = "blocks_per_second";
pub const SYNC_TIME_FORMATTED: &str = "sync_time_formatted";
pub const BLOCK_TIMESTAMP_DATE: &str = "block_timestamp_date";
pub const TRANSACTIONS_PER_SECOND: &str = "transactions_per_second";
pub const MS_PER_TRANSACTION: &str = "ms_per_transaction";

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// The raw column the elapsed sync time was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeSource {
    InProgressSeconds,
    InProgressMillis,
    /// `Accumulated_sync_time[ms]` read as the in-progress clock.
    LegacyTotalMillis,
}

impl TimeSource {
    pub fn column(&self) -> &'static str {
        match self {
            TimeSource::InProgressSeconds => SYNC_IN_PROGRESS_TIME_S,
            TimeSource::InProgressMillis => SYNC_IN_PROGRESS_TIME_MS,
            TimeSource::LegacyTotalMillis => SYNC_TIME_MS,
        }
    }

    fn seconds_divisor(&self) -> f64 {
        match self {
            TimeSource::InProgressSeconds => 1.0,
            TimeSource::InProgressMillis | TimeSource::LegacyTotalMillis => 1000.0,
        }
    }
}

pub fn resolve_time_source(df: &DataFrame, config: &PipelineConfig) -> Option<TimeSource> {
    let has = |name: &str| df.get_column_index(name).is_some();
    if has(SYNC_IN_PROGRESS_TIME_S) {
        Some(TimeSource::InProgressSeconds)
    } else if has(SYNC_IN_PROGRESS_TIME_MS) {
        Some(TimeSource::InProgressMillis)
    } else if config.legacy_total_time_fallback && has(SYNC_TIME_MS) {
        Some(TimeSource::LegacyTotalMillis)
    } else {
        None
    }
}

#[derive(Debug, Clone)]
pub struct Enriched {
    pub df: DataFrame,
    /// `None` when speed could not be derived; `df` is then the input unchanged.
    pub time_source: Option<TimeSource>,
}

/// Adds the derived per-row columns. A frame without a usable time column or
/// without `Block_height` comes back unchanged with a warning instead of an
/// error. Re-running replaces the derived columns.
pub fn enrich(df: &DataFrame, source_name: &str, config: &PipelineConfig) -> Result<Enriched> {
    let Some(time_source) = resolve_time_source(df, config) else {
        tracing::warn!(
            source = source_name,
            "log has no recognised sync time column; sync speed cannot be computed"
        );
        return Ok(Enriched {
            df: df.clone(),
            time_source: None,
        });
    };

    let Some(heights) = float_values(df, BLOCK_HEIGHT)? else {
        tracing::warn!(
            source = source_name,
            "log has no Block_height column; sync speed cannot be computed"
        );
        return Ok(Enriched {
            df: df.clone(),
            time_source: None,
        });
    };

    let divisor = time_source.seconds_divisor();
    let seconds: Vec<Option<f64>> = float_values(df, time_source.column())?
        .unwrap_or_default()
        .into_iter()
        .map(|value| value.map(|v| v / divisor))
        .collect();

    let speed = blocks_per_second(&heights, &seconds);
    let formatted: Vec<String> = seconds
        .iter()
        .map(|value| format_optional_seconds(*value))
        .collect();

    let mut output = df.clone();
    output.with_column(Series::new(SYNC_TIME_S.into(), seconds))?;
    output.with_column(Series::new(BLOCKS_PER_SECOND.into(), speed))?;
    output.with_column(Series::new(SYNC_TIME_FORMATTED.into(), formatted))?;

    if let Some(timestamps) = float_values(df, BLOCK_TIMESTAMP)? {
        let dates: Vec<Option<String>> = timestamps
            .iter()
            .map(|ts| ts.and_then(|ts| genesis_date(config.genesis, ts)))
            .collect();
        output.with_column(Series::new(BLOCK_TIMESTAMP_DATE.into(), dates))?;
    }

    add_transaction_rates(&mut output, df)?;

    tracing::debug!(
        source = source_name,
        time_source = ?time_source,
        rows = output.height(),
        "enriched sync log"
    );

    Ok(Enriched {
        df: output,
        time_source: Some(time_source),
    })
}

/// First difference of height over first difference of time. The leading row,
/// a zero time step and any gap in either column all give 0.
pub fn blocks_per_second(heights: &[Option<f64>], seconds: &[Option<f64>]) -> Vec<f64> {
    let len = heights.len().min(seconds.len());
    let mut speed = Vec::with_capacity(len);
    for idx in 0..len {
        if idx == 0 {
            speed.push(0.0);
            continue;
        }
        let value = match (heights[idx - 1], heights[idx], seconds[idx - 1], seconds[idx]) {
            (Some(prev_h), Some(h), Some(prev_t), Some(t)) => {
                let dt = t - prev_t;
                if dt == 0.0 {
                    0.0
                } else {
                    (h - prev_h) / dt
                }
            }
            _ => 0.0,
        };
        speed.push(if value.is_finite() { value } else { 0.0 });
    }
    speed
}

pub fn genesis_date(genesis: DateTime<Utc>, timestamp: f64) -> Option<String> {
    if !timestamp.is_finite() {
        return None;
    }
    let offset = TimeDelta::try_seconds(timestamp.trunc() as i64)?;
    let instant = genesis.checked_add_signed(offset)?;
    Some(instant.format(DATE_FORMAT).to_string())
}

fn add_transaction_rates(output: &mut DataFrame, raw: &DataFrame) -> Result<()> {
    let push_column = StageTiming::PushBlock.canonical_name();
    let Some(tx_column) = first_present(raw, &TRANSACTION_COUNT_ALIASES) else {
        return Ok(());
    };
    let (Some(push_ms), Some(transactions)) =
        (float_values(raw, push_column)?, float_values(raw, tx_column)?)
    else {
        return Ok(());
    };

    let mut per_second = Vec::with_capacity(push_ms.len());
    let mut ms_per_tx = Vec::with_capacity(push_ms.len());
    for (push, tx) in push_ms.iter().zip(transactions.iter()) {
        let (push, tx) = (push.unwrap_or(0.0), tx.unwrap_or(0.0));
        per_second.push(if push > 0.0 { tx / (push / 1000.0) } else { 0.0 });
        ms_per_tx.push(if tx > 0.0 { push / tx } else { 0.0 });
    }

    output.with_column(Series::new(TRANSACTIONS_PER_SECOND.into(), per_second))?;
    output.with_column(Series::new(MS_PER_TRANSACTION.into(), ms_per_tx))?;
    Ok(())
}
