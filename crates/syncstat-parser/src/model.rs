use std::fmt;

use polars::prelude::*;
use serde::{Deserialize, Serialize, Serializer};

use crate::schema::{SYNC_IN_PROGRESS_TIME_MS, SYNC_IN_PROGRESS_TIME_S, SYNC_TIME_MS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// `sync_progress.csv`: accumulated in-progress time in seconds.
    SyncProgress,
    /// `sync_measurement.csv`: accumulated in-progress time in milliseconds plus stage timings.
    SyncMeasurement,
    /// Measurement logs written before the in-progress column existed.
    LegacyMeasurement,
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::SyncProgress => "sync_progress",
            LogFormat::SyncMeasurement => "sync_measurement",
            LogFormat::LegacyMeasurement => "sync_measurement_legacy",
        }
    }

    pub fn time_column(&self) -> &'static str {
        match self {
            LogFormat::SyncProgress => SYNC_IN_PROGRESS_TIME_S,
            LogFormat::SyncMeasurement => SYNC_IN_PROGRESS_TIME_MS,
            LogFormat::LegacyMeasurement => SYNC_TIME_MS,
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Free-form `Property;Value` pairs from the file preamble, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogMetadata {
    entries: Vec<(String, String)>,
}

impl LogMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Inserts a new pair at the end or replaces the value of an existing key in place.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        let idx = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hostname(&self) -> Option<&str> {
        self.get("Hostname")
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for LogMetadata {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut metadata = LogMetadata::new();
        for (key, value) in iter {
            metadata.set(key, value);
        }
        metadata
    }
}

impl Serialize for LogMetadata {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

/// One loaded log file. `df` holds the raw columns exactly as read; derived
/// metrics live in separate frames so the raw table can be saved back unchanged.
#[derive(Debug, Clone)]
pub struct SyncLog {
    pub source_name: String,
    pub file_hash: String,
    pub format: LogFormat,
    pub metadata: LogMetadata,
    pub df: DataFrame,
}

impl SyncLog {
    pub fn height(&self) -> usize {
        self.df.height()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.df.get_column_index(name).is_some()
    }
}
