use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use comfy_table::Cell;
use syncstat_core::format::{format_fixed, format_signed_fixed, NOT_AVAILABLE};
use syncstat_core::{compare_logs, HeightRange, PipelineConfig, RowDelta};

use super::{classified_cell, new_table, read_log};

#[derive(Args, Debug)]
pub struct RowsArgs {
    /// Original sync log
    file: PathBuf,

    /// Log to compare against the original
    #[arg(long)]
    compare: PathBuf,

    /// Maximum number of rows to print
    #[arg(long, default_value_t = 50)]
    limit: usize,
}

pub fn handle_rows_command(args: RowsArgs, config: &PipelineConfig) -> Result<()> {
    let original = read_log(&args.file)?;
    let comparison = read_log(&args.compare)?;
    let result = compare_logs(&original, &comparison, config, &HeightRange::full())
        .context("failed to compare sync logs")?;

    if result.original.time_source.is_none() || result.comparison.time_source.is_none() {
        bail!("both logs need a sync time column for a per-row comparison");
    }

    let mut table = new_table(
        [
            "Block Height",
            "Sync Time [s] (orig)",
            "Sync Time [s] (comp)",
            "Δ Sync Time [s]",
            "Speed [Blocks/sec] (orig)",
            "Speed [Blocks/sec] (comp)",
            "Δ Speed",
        ]
        .iter()
        .map(|header| header.to_string())
        .collect(),
    );

    for row in result.rows.iter().take(args.limit) {
        table.add_row(row_cells(row));
    }

    println!("{table}");
    println!(
        "{} of {} shared block heights shown",
        result.rows.len().min(args.limit),
        result.rows.len()
    );
    Ok(())
}

fn row_cells(row: &RowDelta) -> Vec<Cell> {
    let value = |v: Option<f64>| v.map(format_fixed).unwrap_or_else(|| NOT_AVAILABLE.to_string());
    let delta = |v: Option<f64>| {
        v.map(format_signed_fixed)
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    };

    vec![
        Cell::new(row.block_height),
        Cell::new(value(row.original_sync_time_s)),
        classified_cell(value(row.comparison_sync_time_s), row.sync_time),
        classified_cell(delta(row.sync_time_delta()), row.sync_time),
        Cell::new(value(row.original_speed)),
        classified_cell(value(row.comparison_speed), row.speed),
        classified_cell(delta(row.speed_delta()), row.speed),
    ]
}
