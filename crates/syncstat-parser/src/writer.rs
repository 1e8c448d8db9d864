use std::path::Path;

use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use polars::prelude::*;
use regex::Regex;

use crate::errors::ParserError;
use crate::model::LogMetadata;

const WRITER: &str = "SYNC_LOG_WRITER";

// A copy counter only ever follows a timestamp, so the timestamp pattern
// absorbs it; the bare counter pattern is for names without a timestamp.
static TIMESTAMP_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_\d{8}_\d{6}(_\d+)?$").expect("static timestamp pattern"));
static COUNTER_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_\d+$").expect("static counter pattern"));
static HOSTNAME_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_hostname_[\w.\-]+$").expect("static hostname suffix pattern"));
static RANGE_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_range_\d+-\d+$").expect("static range pattern"));

static HOSTNAME_UNSAFE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w.\-]").expect("static hostname pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveMode {
    /// Always timestamped; callers add `_1`, `_2`, ... if the name is taken.
    New,
    /// Reuses the base name; only timestamped when a range is applied.
    Overwrite,
}

#[derive(Debug, Clone)]
pub struct FileNameOptions {
    pub mode: SaveMode,
    pub range: Option<(i64, i64)>,
    pub timestamp: NaiveDateTime,
}

/// Serializes a log back into the semicolon format, re-emitting the metadata
/// preamble ahead of the data header.
pub fn render_sync_log(metadata: &LogMetadata, df: &DataFrame) -> Result<String, ParserError> {
    let mut output = String::new();
    if !metadata.is_empty() {
        output.push_str("Property;Value\n");
        for (key, value) in metadata.iter() {
            output.push_str(key);
            output.push(';');
            output.push_str(value);
            output.push('\n');
        }
        output.push_str(";;\n");
    }

    let mut writer = csv::WriterBuilder::new()
        .delimiter(b';')
        .from_writer(Vec::new());

    let names: Vec<&str> = df.get_columns().iter().map(|c| c.name().as_str()).collect();
    writer
        .write_record(&names)
        .map_err(|source| ParserError::Csv {
            parser: WRITER,
            source,
        })?;

    let text_columns = df
        .get_columns()
        .iter()
        .map(|column| column.cast(&DataType::String))
        .collect::<PolarsResult<Vec<Column>>>()
        .map_err(|source| ParserError::Frame {
            parser: WRITER,
            source,
        })?;
    let text_columns = text_columns
        .iter()
        .map(|column| column.str())
        .collect::<PolarsResult<Vec<&StringChunked>>>()
        .map_err(|source| ParserError::Frame {
            parser: WRITER,
            source,
        })?;

    for idx in 0..df.height() {
        let row: Vec<&str> = text_columns
            .iter()
            .map(|column| column.get(idx).unwrap_or(""))
            .collect();
        writer.write_record(&row).map_err(|source| ParserError::Csv {
            parser: WRITER,
            source,
        })?;
    }

    let bytes = writer.into_inner().map_err(|err| ParserError::Render {
        message: format!("failed to flush CSV writer: {err}"),
    })?;
    let body = String::from_utf8(bytes).map_err(|err| ParserError::Render {
        message: format!("rendered CSV was not UTF-8: {err}"),
    })?;
    output.push_str(&body);
    Ok(output)
}

/// Builds `<base>[_range_<s>-<e>][_hostname_<host>][_<YYYYmmdd_HHMMSS>].csv`
/// from the source name after removing suffixes added by earlier saves.
pub fn output_file_name(
    source_name: &str,
    metadata: &LogMetadata,
    options: &FileNameOptions,
) -> String {
    let stem = Path::new(source_name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("unknown_file");
    let mut name = strip_generated_suffixes(stem);

    if let Some((start, end)) = options.range {
        name.push_str(&format!("_range_{start}-{end}"));
    }
    if let Some(hostname) = metadata.hostname() {
        name.push_str("_hostname_");
        name.push_str(&sanitize_hostname(hostname));
    }

    let stamp = match options.mode {
        SaveMode::New => true,
        SaveMode::Overwrite => options.range.is_some(),
    };
    if stamp {
        name.push('_');
        name.push_str(&options.timestamp.format("%Y%m%d_%H%M%S").to_string());
    }

    name.push_str(".csv");
    name
}

/// Removes the range, hostname, timestamp and copy-counter suffixes that
/// `output_file_name` adds, leaving other digit groups in the name alone.
pub fn strip_generated_suffixes(base: &str) -> String {
    let name = if TIMESTAMP_SUFFIX.is_match(base) {
        TIMESTAMP_SUFFIX.replace(base, "")
    } else {
        COUNTER_SUFFIX.replace(base, "")
    };
    let name = HOSTNAME_SUFFIX.replace(&name, "");
    RANGE_SUFFIX.replace(&name, "").into_owned()
}

pub fn sanitize_hostname(hostname: &str) -> String {
    HOSTNAME_UNSAFE.replace_all(hostname, "_").into_owned()
}
