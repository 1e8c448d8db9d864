use crate::errors::ParserError;
use crate::model::{LogFormat, SyncLog};
use crate::registry::SyncLogParser;
use crate::schema::SYNC_IN_PROGRESS_TIME_S;

use super::{build_sync_log, require_column, RawTable};

/// `sync_progress.csv`: block height against accumulated in-progress seconds.
pub struct SyncProgressParser;

impl Default for SyncProgressParser {
    fn default() -> Self {
        Self
    }
}

impl SyncProgressParser {
    const NAME: &'static str = "SYNC_PROGRESS";
}

impl SyncLogParser for SyncProgressParser {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn format(&self) -> LogFormat {
        LogFormat::SyncProgress
    }

    fn parse(&self, content: &str) -> Result<SyncLog, ParserError> {
        let table = RawTable::split(content);
        require_column(Self::NAME, &table, SYNC_IN_PROGRESS_TIME_S)?;
        build_sync_log(Self::NAME, self.format(), &table)
    }
}
