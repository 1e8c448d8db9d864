use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use syncstat_parser::{output_file_name, render_sync_log, FileNameOptions, SaveMode, SyncLog};

use crate::downsample::{average_by_chunks, thin_to_interval};
use crate::error::Result;
use crate::filter::{filter_by_height, HeightRange};

/// Optional row reduction applied after range filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reduction {
    Thin { interval: i64 },
    ChunkAverage { chunk_size: i64 },
}

#[derive(Debug, Clone)]
pub struct SaveOptions {
    pub output_dir: PathBuf,
    pub mode: SaveMode,
    pub range: HeightRange,
    pub set_metadata: Vec<(String, String)>,
    pub remove_metadata: Vec<String>,
    pub reduction: Option<Reduction>,
    pub timestamp: NaiveDateTime,
}

impl SaveOptions {
    pub fn new(output_dir: impl Into<PathBuf>, timestamp: NaiveDateTime) -> Self {
        Self {
            output_dir: output_dir.into(),
            mode: SaveMode::New,
            range: HeightRange::full(),
            set_metadata: Vec::new(),
            remove_metadata: Vec::new(),
            reduction: None,
            timestamp,
        }
    }
}

/// Writes the raw columns of `log` back out with its (edited) metadata and
/// returns the path written.
pub fn save_log(log: &SyncLog, options: &SaveOptions) -> Result<PathBuf> {
    let mut df = filter_by_height(&log.df, &options.range)?;
    df = match options.reduction {
        Some(Reduction::Thin { interval }) => thin_to_interval(&df, interval)?,
        Some(Reduction::ChunkAverage { chunk_size }) => average_by_chunks(&df, chunk_size)?,
        None => df,
    };

    let mut metadata = log.metadata.clone();
    for key in &options.remove_metadata {
        metadata.remove(key);
    }
    for (key, value) in &options.set_metadata {
        metadata.set(key.as_str(), value.as_str());
    }

    let name_options = FileNameOptions {
        mode: options.mode,
        range: options.range.resolve(&log.df)?,
        timestamp: options.timestamp,
    };
    let file_name = output_file_name(&log.source_name, &metadata, &name_options);

    fs::create_dir_all(&options.output_dir)?;
    let mut path = options.output_dir.join(&file_name);
    if options.mode == SaveMode::New {
        path = unused_path(&path);
    }

    let rendered = render_sync_log(&metadata, &df)?;
    fs::write(&path, rendered)?;

    tracing::info!(
        source = %log.source_name,
        path = %path.display(),
        rows = df.height(),
        metadata_keys = metadata.len(),
        "saved sync log"
    );
    Ok(path)
}

/// `path` itself if free, else the first of `<stem>_1.csv`, `<stem>_2.csv`, ...
fn unused_path(path: &Path) -> PathBuf {
    if !path.exists() {
        return path.to_path_buf();
    }
    let stem = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("sync_log")
        .to_string();
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("csv")
        .to_string();

    let mut counter = 1u32;
    loop {
        let candidate = path.with_file_name(format!("{stem}_{counter}.{extension}"));
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}
