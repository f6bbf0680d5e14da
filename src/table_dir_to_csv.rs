use anyhow::{Context, Result};
use clap::Parser;
use complex_xml_to_csvs::concat::{concat_table_dir, ConcatOutcome};
use complex_xml_to_csvs::logging::{self, LogLevel};
use std::path::PathBuf;

/// Concatenate the batch CSVs of each table directory into `<dir>.csv` and
/// remove the directory.
#[derive(Debug, Parser)]
#[command(name = "table_dir_to_csv", version)]
struct Args {
    #[arg(required = true)]
    dirs: Vec<PathBuf>,
}

fn main() -> Result<()> {
    logging::init(LogLevel::Info);

    for dir in Args::parse().dirs {
        let outcome = concat_table_dir(&dir)
            .with_context(|| format!("failed to concatenate {}", dir.display()))?;
        if let ConcatOutcome::Written { path, .. } = outcome {
            println!("{}", path.display());
        }
    }
    Ok(())
}
