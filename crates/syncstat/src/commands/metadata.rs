use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use super::{new_table, read_log};

#[derive(Args, Debug)]
pub struct MetadataArgs {
    file: PathBuf,
}

pub fn handle_metadata_command(args: MetadataArgs) -> Result<()> {
    let log = read_log(&args.file)?;
    if log.metadata.is_empty() {
        println!("{} has no metadata preamble", args.file.display());
        return Ok(());
    }

    let mut table = new_table(vec!["Property".to_string(), "Value".to_string()]);
    for (key, value) in log.metadata.iter() {
        table.add_row(vec![key, value]);
    }
    println!("{table}");
    println!("format: {}  rows: {}  blake3: {}", log.format, log.height(), log.file_hash);
    Ok(())
}
