use std::fmt;

use polars::error::PolarsError;
use thiserror::Error;

/// Why one format parser declined a file.
#[derive(Debug, Clone)]
pub struct ParserAttempt {
    pub parser: &'static str,
    pub message: String,
}

impl ParserAttempt {
    pub fn new(parser: &'static str, message: impl Into<String>) -> Self {
        Self {
            parser,
            message: message.into(),
        }
    }
}

impl fmt::Display for ParserAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.parser, self.message)
    }
}

#[derive(Debug, Error)]
pub enum ParserError {
    /// The file is not in this parser's format; the registry tries the next one.
    #[error("{parser} format mismatch: {reason}")]
    FormatMismatch {
        parser: &'static str,
        reason: String,
    },

    #[error("{parser}: column '{column}' appears more than once in header row {row_index}")]
    DuplicateColumn {
        parser: &'static str,
        row_index: usize,
        column: String,
    },

    #[error("{parser}: line {line_index} has {found} fields, header has {expected}")]
    RaggedRow {
        parser: &'static str,
        line_index: usize,
        expected: usize,
        found: usize,
    },

    #[error("{parser} could not read the semicolon table: {source}")]
    Csv {
        parser: &'static str,
        #[source]
        source: csv::Error,
    },

    #[error("{parser} could not build the log table: {source}")]
    Frame {
        parser: &'static str,
        #[source]
        source: PolarsError,
    },

    #[error("{parser} found a header but no block rows")]
    EmptyData { parser: &'static str },

    #[error("{parser} recognized the log but it lacks: {}", columns.join(", "))]
    MissingColumns {
        parser: &'static str,
        columns: Vec<String>,
    },

    /// No format claimed the file. `missing` names the columns a sync log needs.
    #[error(
        "the file is missing essential columns: {} ({})",
        missing.join(", "),
        format_attempts(attempts)
    )]
    UnrecognizedLog {
        missing: Vec<String>,
        attempts: Vec<ParserAttempt>,
    },

    #[error("no parser recognized this file; attempts: {}", format_attempts(attempts))]
    NoMatchingParser { attempts: Vec<ParserAttempt> },

    #[error("failed to render sync log: {message}")]
    Render { message: String },
}

fn format_attempts(attempts: &[ParserAttempt]) -> String {
    attempts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
