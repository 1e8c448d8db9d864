use std::fs;
use std::path::Path;

use polars::prelude::*;
use serde::Serialize;
use syncstat_parser::{parse_sync_log, SyncLog};

use crate::comparison::{compare_summaries, row_deltas, MetricDelta, RowDelta};
use crate::config::PipelineConfig;
use crate::enrichment::{
    enrich, TimeSource, BLOCKS_PER_SECOND, MS_PER_TRANSACTION, TRANSACTIONS_PER_SECOND,
};
use crate::error::Result;
use crate::filter::{filter_by_height, HeightRange};
use crate::moving_average::add_moving_averages;
use crate::summary::{summarize, SyncSummary};

pub fn load_log(path: &Path) -> Result<SyncLog> {
    let content = fs::read_to_string(path)?;
    let source_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("unknown_file");
    load_log_from_str(source_name, &content)
}

pub fn load_log_from_str(source_name: &str, content: &str) -> Result<SyncLog> {
    Ok(parse_sync_log(source_name, content)?)
}

/// One log after filtering, enrichment and summarising.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub source_name: String,
    #[serde(skip)]
    pub enriched: DataFrame,
    pub time_source: Option<TimeSource>,
    pub summary: SyncSummary,
}

impl Analysis {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Columns smoothed by `analyze`, before the configured stage columns.
const SMOOTHED_COLUMNS: [&str; 3] = [BLOCKS_PER_SECOND, TRANSACTIONS_PER_SECOND, MS_PER_TRANSACTION];

pub fn analyze(log: &SyncLog, config: &PipelineConfig, range: &HeightRange) -> Result<Analysis> {
    let filtered = filter_by_height(&log.df, range)?;
    let enriched = enrich(&filtered, &log.source_name, config)?;

    let mut smoothed: Vec<&str> = SMOOTHED_COLUMNS.to_vec();
    smoothed.extend(config.stage_columns.iter().map(String::as_str));
    let with_averages =
        add_moving_averages(&enriched.df, &smoothed, config.moving_average_window)?;

    let summary = summarize(&with_averages, config)?;
    tracing::info!(
        source = %log.source_name,
        rows = with_averages.height(),
        metrics = summary.len(),
        "analyzed sync log"
    );

    Ok(Analysis {
        source_name: log.source_name.clone(),
        enriched: with_averages,
        time_source: enriched.time_source,
        summary,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct Comparison {
    pub original: Analysis,
    pub comparison: Analysis,
    pub deltas: Vec<MetricDelta>,
    pub rows: Vec<RowDelta>,
}

impl Comparison {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Analyzes both logs over the same range and pairs their summaries. Row
/// deltas are only computed when both logs yielded a sync speed.
pub fn compare_logs(
    original: &SyncLog,
    comparison: &SyncLog,
    config: &PipelineConfig,
    range: &HeightRange,
) -> Result<Comparison> {
    let original = analyze(original, config, range)?;
    let comparison = analyze(comparison, config, range)?;
    let deltas = compare_summaries(&original.summary, &comparison.summary);

    let rows = if original.time_source.is_some() && comparison.time_source.is_some() {
        row_deltas(&original.enriched, &comparison.enriched)?
    } else {
        tracing::warn!(
            original = %original.source_name,
            comparison = %comparison.source_name,
            "skipping per-row comparison; a log has no sync speed"
        );
        Vec::new()
    };

    Ok(Comparison {
        original,
        comparison,
        deltas,
        rows,
    })
}

