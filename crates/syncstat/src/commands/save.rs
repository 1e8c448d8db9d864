use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use chrono::Local;
use clap::Args;
use syncstat_core::persistence::{save_log, Reduction, SaveOptions};
use syncstat_core::PipelineConfig;
use syncstat_parser::SaveMode;

use super::{height_range, read_log};

#[derive(Args, Debug)]
pub struct SaveArgs {
    /// Sync log to re-save
    file: PathBuf,

    #[arg(long)]
    start: Option<i64>,

    #[arg(long)]
    end: Option<i64>,

    /// Set a metadata property (repeatable)
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    set: Vec<(String, String)>,

    /// Remove a metadata property (repeatable)
    #[arg(long = "remove", value_name = "KEY")]
    remove: Vec<String>,

    /// Reuse the base file name instead of writing a new timestamped file
    #[arg(long)]
    overwrite: bool,

    /// Output directory; defaults to the input file's directory
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Keep only genesis and every Nth block height
    #[arg(long, conflicts_with = "chunk_average")]
    thin: Option<i64>,

    /// Collapse each chunk of blocks (see `chunk_size`) into one row
    #[arg(long)]
    chunk_average: bool,
}

pub fn handle_save_command(args: SaveArgs, config: &PipelineConfig) -> Result<()> {
    let log = read_log(&args.file)?;

    let output_dir = args
        .out_dir
        .clone()
        .unwrap_or_else(|| parent_dir(&args.file));

    let mut options = SaveOptions::new(output_dir, Local::now().naive_local());
    options.mode = if args.overwrite {
        SaveMode::Overwrite
    } else {
        SaveMode::New
    };
    options.range = height_range(args.start, args.end)?;
    options.set_metadata = args.set;
    options.remove_metadata = args.remove;
    options.reduction = match (args.thin, args.chunk_average) {
        (Some(interval), _) => Some(Reduction::Thin { interval }),
        (None, true) => Some(Reduction::ChunkAverage {
            chunk_size: config.chunk_size,
        }),
        (None, false) => None,
    };

    let path = save_log(&log, &options)
        .with_context(|| format!("failed to save {}", args.file.display()))?;
    println!("Saved {}", path.display());
    Ok(())
}

fn parent_dir(file: &Path) -> PathBuf {
    file.parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

fn parse_key_value(raw: &str) -> Result<(String, String)> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("expected KEY=VALUE, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(anyhow!("metadata key must not be empty"));
    }
    Ok((key.to_string(), value.trim().to_string()))
}
