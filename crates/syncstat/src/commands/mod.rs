use std::path::Path;

use anyhow::{Context, Result};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, ContentArrangement, Table};
use syncstat_core::{load_log, Classification, HeightRange};
use syncstat_parser::SyncLog;

pub mod enrich;
pub mod metadata;
pub mod rows;
pub mod save;
pub mod summary;

pub(crate) fn read_log(path: &Path) -> Result<SyncLog> {
    load_log(path).with_context(|| format!("failed to load sync log {}", path.display()))
}

pub(crate) fn height_range(start: Option<i64>, end: Option<i64>) -> Result<HeightRange> {
    HeightRange::new(start, end).context("invalid block height range")
}

pub(crate) fn new_table(header: Vec<String>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

/// Green for improvements, red for regressions, plain otherwise.
pub(crate) fn classified_cell(text: String, classification: Classification) -> Cell {
    let cell = Cell::new(text);
    match classification {
        Classification::Improvement => cell.fg(Color::Green),
        Classification::Regression => cell.fg(Color::Red),
        Classification::Neutral => cell,
    }
}
