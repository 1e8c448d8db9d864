use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use syncstat_parser::StageTiming;

use crate::error::{PipelineError, Result};

/// 2014-08-11 02:00:00 UTC, the instant block timestamps are counted from.
pub const GENESIS_UNIX_SECONDS: i64 = 1_407_722_400;
pub const DEFAULT_CHUNK_SIZE: i64 = 5000;
pub const MOVING_AVERAGE_WINDOWS: [usize; 6] = [10, 100, 200, 300, 400, 500];

pub fn network_genesis() -> DateTime<Utc> {
    DateTime::from_timestamp(GENESIS_UNIX_SECONDS, 0).unwrap_or_default()
}

/// Trailing sample count for rolling means. Only the preset sizes are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct MovingAverageWindow(usize);

impl MovingAverageWindow {
    pub fn new(size: usize) -> Result<Self> {
        if MOVING_AVERAGE_WINDOWS.contains(&size) {
            Ok(Self(size))
        } else {
            Err(PipelineError::Validation(format!(
                "moving average window must be one of {MOVING_AVERAGE_WINDOWS:?}, got {size}"
            )))
        }
    }

    pub fn size(&self) -> usize {
        self.0
    }
}

impl Default for MovingAverageWindow {
    fn default() -> Self {
        Self(100)
    }
}

impl TryFrom<usize> for MovingAverageWindow {
    type Error = PipelineError;

    fn try_from(size: usize) -> Result<Self> {
        Self::new(size)
    }
}

impl From<MovingAverageWindow> for usize {
    fn from(window: MovingAverageWindow) -> Self {
        window.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub moving_average_window: MovingAverageWindow,
    /// Read `Accumulated_sync_time[ms]` as the in-progress clock when a log has
    /// no in-progress column. Some node builds wrote the two columns swapped.
    pub legacy_total_time_fallback: bool,
    pub genesis: DateTime<Utc>,
    pub chunk_size: i64,
    pub stage_columns: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            moving_average_window: MovingAverageWindow::default(),
            legacy_total_time_fallback: true,
            genesis: network_genesis(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            stage_columns: StageTiming::all()
                .iter()
                .map(|stage| stage.canonical_name().to_string())
                .collect(),
        }
    }
}

impl PipelineConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: PipelineConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&raw)?;
        tracing::debug!(path = %path.display(), "loaded pipeline config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size <= 0 {
            return Err(PipelineError::Validation(format!(
                "chunk_size must be positive, got {}",
                self.chunk_size
            )));
        }
        Ok(())
    }
}
