use polars::prelude::*;

use crate::errors::ParserError;
use crate::model::{LogFormat, LogMetadata, SyncLog};
use crate::schema::{BLOCK_HEIGHT, BLOCK_TIMESTAMP, TEXT_COLUMNS};

const METADATA_MARKER: &str = "Property;Value";
const METADATA_TERMINATOR: &str = ";;";

/// Index of the data header: the first line naming a block column with at
/// least two separators. Files without a preamble start at line 0.
pub fn find_header_row(lines: &[&str]) -> usize {
    lines
        .iter()
        .position(|line| {
            (line.contains(BLOCK_HEIGHT) || line.contains(BLOCK_TIMESTAMP))
                && line.matches(';').count() >= 2
        })
        .unwrap_or(0)
}

pub fn extract_metadata(lines: &[&str]) -> LogMetadata {
    let mut metadata = LogMetadata::new();
    let mut in_section = false;

    for raw in lines {
        let line = raw.trim();
        if !in_section {
            if line.contains(METADATA_MARKER) {
                in_section = true;
            }
            continue;
        }
        if line.contains(BLOCK_HEIGHT) || line.contains(BLOCK_TIMESTAMP) || line == METADATA_TERMINATOR
        {
            break;
        }
        if let Some((key, value)) = line.split_once(';') {
            if !key.is_empty() && !value.is_empty() {
                metadata.set(key, value);
            }
        }
    }

    metadata
}

/// The file split into its preamble and the header/data region.
pub(crate) struct RawTable<'a> {
    pub lines: Vec<&'a str>,
    pub header_row: usize,
    pub columns: Vec<String>,
}

impl<'a> RawTable<'a> {
    pub fn split(content: &'a str) -> Self {
        let lines: Vec<&str> = content.lines().collect();
        let header_row = find_header_row(&lines);
        let columns = lines
            .get(header_row)
            .map(|header| header.split(';').map(|name| name.trim().to_string()).collect())
            .unwrap_or_default();
        Self {
            lines,
            header_row,
            columns,
        }
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|column| column == name)
    }

    pub fn metadata(&self) -> LogMetadata {
        extract_metadata(&self.lines[..self.header_row])
    }
}

pub(crate) fn require_column(
    parser: &'static str,
    table: &RawTable<'_>,
    column: &str,
) -> Result<(), ParserError> {
    if table.has_column(column) {
        Ok(())
    } else {
        Err(ParserError::FormatMismatch {
            parser,
            reason: format!("missing column '{column}'"),
        })
    }
}

/// Parses the data region of `table` into a typed frame and assembles the log.
pub(crate) fn build_sync_log(
    parser: &'static str,
    format: LogFormat,
    table: &RawTable<'_>,
) -> Result<SyncLog, ParserError> {
    if !table.has_column(BLOCK_HEIGHT) {
        return Err(ParserError::MissingColumns {
            parser,
            columns: vec![BLOCK_HEIGHT.to_string()],
        });
    }

    let mut seen = std::collections::HashSet::new();
    if let Some(duplicate) = table
        .columns
        .iter()
        .filter(|name| !name.is_empty())
        .find(|name| !seen.insert(name.as_str()))
    {
        return Err(ParserError::DuplicateColumn {
            parser,
            row_index: table.header_row,
            column: duplicate.clone(),
        });
    }

    let df = build_frame(parser, table)?;
    if df.height() == 0 {
        return Err(ParserError::EmptyData { parser });
    }

    Ok(SyncLog {
        source_name: String::new(),
        file_hash: String::new(),
        format,
        metadata: table.metadata(),
        df,
    })
}

fn build_frame(parser: &'static str, table: &RawTable<'_>) -> Result<DataFrame, ParserError> {
    let body = table.lines[table.header_row + 1..].join("\n");
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .flexible(true)
        .from_reader(body.as_bytes());

    let width = table.columns.len();
    let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); width];

    for (row_idx, record) in reader.records().enumerate() {
        let record = record.map_err(|source| ParserError::Csv { parser, source })?;
        // header is 1-indexed line `header_row + 1`
        let line_index = table.header_row + row_idx + 2;

        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        if record.len() > width {
            // a trailing separator yields one empty extra field
            let extra_is_empty = record.iter().skip(width).all(|field| field.trim().is_empty());
            if !extra_is_empty {
                return Err(ParserError::RaggedRow {
                    parser,
                    line_index,
                    expected: width,
                    found: record.len(),
                });
            }
        }

        for (idx, column) in cells.iter_mut().enumerate() {
            let value = record
                .get(idx)
                .map(str::trim)
                .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("nan"))
                .map(str::to_string);
            column.push(value);
        }
    }

    let mut columns: Vec<Column> = Vec::with_capacity(width);
    for (name, values) in table.columns.iter().zip(cells) {
        if name.is_empty() {
            continue;
        }
        columns.push(typed_series(name, values).into());
    }

    DataFrame::new(columns).map_err(|source| ParserError::Frame { parser, source })
}

/// Integer when every present cell is an integer, float when every present
/// cell is numeric, text otherwise.
fn typed_series(name: &str, values: Vec<Option<String>>) -> Series {
    if !TEXT_COLUMNS.contains(&name) {
        if let Some(ints) = parse_all::<i64>(&values) {
            return Series::new(name.into(), ints);
        }
        if let Some(floats) = parse_all::<f64>(&values) {
            return Series::new(name.into(), floats);
        }
    }
    let text: Vec<Option<&str>> = values.iter().map(|v| v.as_deref()).collect();
    Series::new(name.into(), text)
}

fn parse_all<T: std::str::FromStr>(values: &[Option<String>]) -> Option<Vec<Option<T>>> {
    values
        .iter()
        .map(|value| match value {
            Some(raw) => raw.parse::<T>().ok().map(Some),
            None => Some(None),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_row_skips_preamble() {
        let lines = vec![
            "Property;Value",
            "Hostname;node-1",
            ";;",
            "Block_height;Block_timestamp;Accumulated_sync_in_progress_time[s]",
            "1;100;2",
        ];
        assert_eq!(find_header_row(&lines), 3);
    }

    #[test]
    fn header_row_falls_back_to_first_line() {
        let lines = vec!["a;b;c", "1;2;3"];
        assert_eq!(find_header_row(&lines), 0);
    }

    #[test]
    fn metadata_ignores_incomplete_pairs() {
        let lines = vec![
            "Property;Value",
            "Hostname;node-1",
            "Empty;",
            ";orphan",
            "no separator here",
            "OS Name;Linux;x86_64",
            ";;",
            "Ignored;after terminator",
        ];
        let metadata = extract_metadata(&lines);
        assert_eq!(metadata.len(), 2);
        assert_eq!(metadata.hostname(), Some("node-1"));
        assert_eq!(metadata.get("OS Name"), Some("Linux;x86_64"));
        assert_eq!(metadata.get("Ignored"), None);
    }

    #[test]
    fn metadata_requires_marker() {
        let lines = vec!["Hostname;node-1", "Block_height;Block_timestamp;x"];
        assert!(extract_metadata(&lines).is_empty());
    }
}
