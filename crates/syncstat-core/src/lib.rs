pub mod comparison;
pub mod config;
pub mod downsample;
pub mod enrichment;
pub mod error;
pub mod filter;
pub mod format;
mod frame;
pub mod moving_average;
pub mod persistence;
pub mod pipeline;
pub mod stats;
pub mod summary;

pub use comparison::{compare_summaries, row_deltas, Classification, Direction, MetricDelta, RowDelta};
pub use config::{MovingAverageWindow, PipelineConfig};
pub use enrichment::{enrich, Enriched, TimeSource};
pub use error::{PipelineError, Result};
pub use filter::{filter_by_height, HeightRange};
pub use pipeline::{analyze, compare_logs, load_log, load_log_from_str, Analysis, Comparison};
pub use summary::{summarize, MetricKey, MetricValue, Stat, SyncSummary};
