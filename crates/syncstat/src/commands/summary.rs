use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use comfy_table::{Attribute, Cell, Table};
use syncstat_core::summary::MetricValue;
use syncstat_core::{analyze, compare_logs, MetricDelta, MetricKey, PipelineConfig, SyncSummary};

use super::{classified_cell, height_range, new_table, read_log};

#[derive(Args, Debug)]
pub struct SummaryArgs {
    /// Sync log to summarise
    file: PathBuf,

    /// Second log to compare against the first
    #[arg(long)]
    compare: Option<PathBuf>,

    /// First block height to include
    #[arg(long)]
    start: Option<i64>,

    /// Last block height to include
    #[arg(long)]
    end: Option<i64>,

    /// Print JSON instead of a table
    #[arg(long)]
    json: bool,
}

pub fn handle_summary_command(args: SummaryArgs, config: &PipelineConfig) -> Result<()> {
    let range = height_range(args.start, args.end)?;
    let original = read_log(&args.file)?;

    let Some(compare_path) = args.compare else {
        let analysis = analyze(&original, config, &range)
            .with_context(|| format!("failed to analyze {}", args.file.display()))?;
        if args.json {
            println!("{}", analysis.to_json()?);
        } else {
            println!("{}", single_table(&analysis.source_name, &analysis.summary));
        }
        return Ok(());
    };

    let comparison_log = read_log(&compare_path)?;
    let comparison = compare_logs(&original, &comparison_log, config, &range)
        .context("failed to compare sync logs")?;

    if args.json {
        println!("{}", comparison.to_json()?);
    } else {
        println!(
            "{}",
            comparison_table(
                (&comparison.original.source_name, &comparison.original.summary),
                (&comparison.comparison.source_name, &comparison.comparison.summary),
                &comparison.deltas,
            )
        );
    }
    Ok(())
}

fn single_table(source: &str, summary: &SyncSummary) -> Table {
    let mut table = new_table(vec!["Metric".to_string(), source.to_string()]);
    let mut group = None;
    for entry in summary.iter() {
        push_group_heading(&mut table, &mut group, &entry.metric, 2);
        table.add_row(vec![
            Cell::new(entry.metric.to_string()),
            Cell::new(&entry.value.display),
        ]);
    }
    table
}

fn comparison_table(
    original: (&str, &SyncSummary),
    comparison: (&str, &SyncSummary),
    deltas: &[MetricDelta],
) -> Table {
    let deltas: HashMap<&MetricKey, &MetricDelta> =
        deltas.iter().map(|delta| (&delta.metric, delta)).collect();

    // metrics of the original first, then any only the comparison has
    let mut metrics: Vec<&MetricKey> = original.1.iter().map(|entry| &entry.metric).collect();
    metrics.extend(
        comparison
            .1
            .iter()
            .map(|entry| &entry.metric)
            .filter(|metric| original.1.get(metric).is_none()),
    );

    let mut table = new_table(vec![
        "Metric".to_string(),
        format!("Original: {}", original.0),
        format!("Comparison: {}", comparison.0),
    ]);
    let mut group = None;
    for metric in metrics {
        push_group_heading(&mut table, &mut group, metric, 3);
        let comparison_cell = match (comparison.1.get(metric), deltas.get(metric)) {
            (Some(value), Some(delta)) => classified_cell(
                format!("{} ({})", value.display, delta.display),
                delta.classification,
            ),
            (Some(value), None) => Cell::new(&value.display),
            (None, _) => Cell::new(MetricValue::not_available().display),
        };
        let original_cell = original
            .1
            .get(metric)
            .map(|value| Cell::new(&value.display))
            .unwrap_or_else(|| Cell::new(MetricValue::not_available().display));

        table.add_row(vec![
            Cell::new(metric.to_string()),
            original_cell,
            comparison_cell,
        ]);
    }
    table
}

fn push_group_heading(
    table: &mut Table,
    current: &mut Option<String>,
    metric: &MetricKey,
    width: usize,
) {
    let group = metric.group();
    if group.is_some() && group != *current {
        if let Some(label) = &group {
            let mut row = vec![Cell::new(label).add_attribute(Attribute::Bold)];
            row.extend((1..width).map(|_| Cell::new("")));
            table.add_row(row);
        }
    }
    *current = group;
}
