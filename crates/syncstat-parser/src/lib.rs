pub mod errors;
pub mod formats;
pub mod model;
mod registry;
pub mod schema;
pub mod writer;

pub use errors::{ParserAttempt, ParserError};
pub use formats::{extract_metadata, find_header_row};
pub use model::{LogFormat, LogMetadata, SyncLog};
pub use registry::{parse_sync_log, parse_with_parsers, SyncLogParser};
pub use schema::StageTiming;
pub use writer::{output_file_name, render_sync_log, FileNameOptions, SaveMode};

#[cfg(test)]
mod tests;
