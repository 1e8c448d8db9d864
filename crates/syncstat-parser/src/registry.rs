use crate::errors::{ParserAttempt, ParserError};
use crate::formats::{
    LegacyMeasurementParser, RawTable, SyncMeasurementParser, SyncProgressParser,
};
use crate::model::{LogFormat, SyncLog};
use crate::schema::BLOCK_HEIGHT;

pub trait SyncLogParser {
    fn name(&self) -> &'static str;
    fn format(&self) -> LogFormat;
    fn parse(&self, content: &str) -> Result<SyncLog, ParserError>;
}

/// Parses a sync log of any supported format and stamps it with its source
/// name and content hash.
pub fn parse_sync_log(source_name: &str, content: &str) -> Result<SyncLog, ParserError> {
    let sync_progress = SyncProgressParser;
    let sync_measurement = SyncMeasurementParser;
    let legacy_measurement = LegacyMeasurementParser;
    let parsers: [&dyn SyncLogParser; 3] = [&sync_progress, &sync_measurement, &legacy_measurement];

    let mut log = match parse_with_parsers(content, &parsers) {
        Ok(log) => log,
        Err(ParserError::NoMatchingParser { attempts }) => {
            return Err(ParserError::UnrecognizedLog {
                missing: missing_essential_columns(content),
                attempts,
            })
        }
        Err(err) => return Err(err),
    };

    log.source_name = source_name.to_string();
    log.file_hash = blake3::hash(content.as_bytes()).to_hex().to_string();
    tracing::info!(
        source = source_name,
        format = log.format.as_str(),
        rows = log.height(),
        metadata_keys = log.metadata.len(),
        "parsed sync log"
    );
    Ok(log)
}

pub fn parse_with_parsers(
    content: &str,
    parsers: &[&dyn SyncLogParser],
) -> Result<SyncLog, ParserError> {
    let mut attempts = Vec::new();

    for parser in parsers {
        match parser.parse(content) {
            Ok(parsed) => return Ok(parsed),
            Err(ParserError::FormatMismatch { reason, .. }) => {
                attempts.push(ParserAttempt::new(parser.name(), reason));
            }
            Err(err) => return Err(err),
        }
    }

    Err(ParserError::NoMatchingParser { attempts })
}

fn missing_essential_columns(content: &str) -> Vec<String> {
    let table = RawTable::split(content);
    let mut missing = Vec::new();
    if !table.has_column(BLOCK_HEIGHT) {
        missing.push(BLOCK_HEIGHT.to_string());
    }
    missing.push("Accumulated_sync_in_progress_time[s/ms]".to_string());
    missing
}
