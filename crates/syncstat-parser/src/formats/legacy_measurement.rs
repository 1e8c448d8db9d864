use crate::errors::ParserError;
use crate::model::{LogFormat, SyncLog};
use crate::registry::SyncLogParser;
use crate::schema::{SYNC_IN_PROGRESS_TIME_MS, SYNC_IN_PROGRESS_TIME_S, SYNC_TIME_MS};

use super::{build_sync_log, require_column, RawTable};

/// Measurement logs that only carry `Accumulated_sync_time[ms]`. Some node
/// builds wrote the in-progress clock into this column, so the pipeline may
/// treat it as the in-progress time when configured to.
pub struct LegacyMeasurementParser;

impl Default for LegacyMeasurementParser {
    fn default() -> Self {
        Self
    }
}

impl LegacyMeasurementParser {
    const NAME: &'static str = "SYNC_MEASUREMENT_LEGACY";
}

impl SyncLogParser for LegacyMeasurementParser {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn format(&self) -> LogFormat {
        LogFormat::LegacyMeasurement
    }

    fn parse(&self, content: &str) -> Result<SyncLog, ParserError> {
        let table = RawTable::split(content);
        if table.has_column(SYNC_IN_PROGRESS_TIME_S) || table.has_column(SYNC_IN_PROGRESS_TIME_MS)
        {
            return Err(ParserError::FormatMismatch {
                parser: Self::NAME,
                reason: "file carries an in-progress time column".to_string(),
            });
        }
        require_column(Self::NAME, &table, SYNC_TIME_MS)?;
        build_sync_log(Self::NAME, self.format(), &table)
    }
}
