use crate::errors::ParserError;
use crate::model::{LogFormat, SyncLog};
use crate::registry::SyncLogParser;
use crate::schema::{StageTiming, SYNC_IN_PROGRESS_TIME_MS};

use super::{build_sync_log, require_column, RawTable};

/// `sync_measurement.csv`: millisecond clocks plus per-stage block timings.
pub struct SyncMeasurementParser;

impl Default for SyncMeasurementParser {
    fn default() -> Self {
        Self
    }
}

impl SyncMeasurementParser {
    const NAME: &'static str = "SYNC_MEASUREMENT";
}

impl SyncLogParser for SyncMeasurementParser {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn format(&self) -> LogFormat {
        LogFormat::SyncMeasurement
    }

    fn parse(&self, content: &str) -> Result<SyncLog, ParserError> {
        let table = RawTable::split(content);
        require_column(Self::NAME, &table, SYNC_IN_PROGRESS_TIME_MS)?;

        let stages = table
            .columns
            .iter()
            .filter(|column| StageTiming::from_column(column).is_some())
            .count();
        tracing::debug!(parser = Self::NAME, stages, "stage timing columns detected");

        build_sync_log(Self::NAME, self.format(), &table)
    }
}
