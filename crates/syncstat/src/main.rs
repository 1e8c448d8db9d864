use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use syncstat_core::PipelineConfig;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod commands;
use commands::enrich::{handle_enrich_command, EnrichArgs};
use commands::metadata::{handle_metadata_command, MetadataArgs};
use commands::rows::{handle_rows_command, RowsArgs};
use commands::save::{handle_save_command, SaveArgs};
use commands::summary::{handle_summary_command, SummaryArgs};

const CONFIG_ENV: &str = "SYNCSTAT_CONFIG";

/// Sync speed and timing statistics for node sync logs
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Pipeline configuration (TOML). Falls back to $SYNCSTAT_CONFIG.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Summary statistics for one log, or two logs side by side
    Summary(SummaryArgs),
    /// Write the log with derived columns and moving averages
    Enrich(EnrichArgs),
    /// Per-height comparison of two logs
    Rows(RowsArgs),
    /// Print the metadata preamble
    Metadata(MetadataArgs),
    /// Re-save a log with an optional range, metadata edits and thinning
    Save(SaveArgs),
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let config = load_config(cli.config)?;

    match cli.command {
        Command::Summary(args) => handle_summary_command(args, &config),
        Command::Enrich(args) => handle_enrich_command(args, &config),
        Command::Rows(args) => handle_rows_command(args, &config),
        Command::Metadata(args) => handle_metadata_command(args),
        Command::Save(args) => handle_save_command(args, &config),
    }
}

fn init_tracing(json: bool) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(flag: Option<PathBuf>) -> Result<PipelineConfig> {
    let path = flag.or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));
    match path {
        Some(path) => {
            let config = PipelineConfig::load(&path)
                .with_context(|| format!("failed to load config from {}", path.display()))?;
            debug!(path = %path.display(), "using pipeline config");
            Ok(config)
        }
        None => Ok(PipelineConfig::default()),
    }
}
