mod common;
mod legacy_measurement;
mod sync_measurement;
mod sync_progress;

pub use common::{extract_metadata, find_header_row};
pub use legacy_measurement::LegacyMeasurementParser;
pub use sync_measurement::SyncMeasurementParser;
pub use sync_progress::SyncProgressParser;

pub(crate) use common::{build_sync_log, require_column, RawTable};
