use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use syncstat_core::{analyze, MovingAverageWindow, PipelineConfig};
use syncstat_parser::render_sync_log;
use tracing::info;

use super::{height_range, read_log};

#[derive(Args, Debug)]
pub struct EnrichArgs {
    /// Sync log to enrich
    file: PathBuf,

    /// Moving average window (10, 100, 200, 300, 400 or 500 samples)
    #[arg(long)]
    window: Option<usize>,

    #[arg(long)]
    start: Option<i64>,

    #[arg(long)]
    end: Option<i64>,

    /// Where to write the enriched CSV
    #[arg(long)]
    out: PathBuf,
}

pub fn handle_enrich_command(args: EnrichArgs, config: &PipelineConfig) -> Result<()> {
    let mut config = config.clone();
    if let Some(window) = args.window {
        config.moving_average_window = MovingAverageWindow::new(window)?;
    }

    let range = height_range(args.start, args.end)?;
    let log = read_log(&args.file)?;
    let analysis = analyze(&log, &config, &range)
        .with_context(|| format!("failed to enrich {}", args.file.display()))?;

    if analysis.time_source.is_none() {
        eprintln!(
            "warning: {} has no usable sync time column; only raw columns were written",
            args.file.display()
        );
    }

    let rendered = render_sync_log(&log.metadata, &analysis.enriched)?;
    fs::write(&args.out, rendered)
        .with_context(|| format!("failed to write {}", args.out.display()))?;

    info!(
        source = %args.file.display(),
        out = %args.out.display(),
        rows = analysis.enriched.height(),
        columns = analysis.enriched.width(),
        "wrote enriched log"
    );
    println!("Wrote {}", args.out.display());
    Ok(())
}
