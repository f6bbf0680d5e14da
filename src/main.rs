use anyhow::{Context, Result};
use clap::Parser;
use complex_xml_to_csvs::builder::CategoryReentry;
use complex_xml_to_csvs::convert::{
    xml_to_csv_batches, ConvertConfig, DEFAULT_BATCH_SIZE, DEFAULT_OUTPUT_DIR,
};
use complex_xml_to_csvs::logging::{self, LogLevel};
use complex_xml_to_csvs::parser::{ErrorPolicy, ParseOptions, StopReason};
use complex_xml_to_csvs::splitter::{WriterOptions, DEFAULT_TABLE_PREFIX};
use std::path::PathBuf;

/// Split a complex XML export into per-table CSV batches.
#[derive(Debug, Parser)]
#[command(name = "complex_xml_to_csvs", version)]
struct Args {
    /// Export to convert; `.gz` files are decompressed on the fly.
    input: PathBuf,

    /// Stop after this many records (0 = no limit).
    #[arg(long, default_value_t = 0)]
    maxrecords: usize,

    #[arg(long, env = "COMPLEX_OUTPUT_DIR", default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,

    /// JSON table definitions.
    #[arg(long, alias = "schema-file-xls", default_value = "schema.json")]
    schema_file: PathBuf,

    /// Records per CSV batch.
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    #[arg(long, default_value = DEFAULT_TABLE_PREFIX)]
    table_prefix: String,

    /// Append rows when a category appears twice in one record instead of
    /// replacing the earlier ones.
    #[arg(long)]
    append_repeated_categories: bool,

    /// Advance the batch number even for batches that wrote nothing.
    #[arg(long)]
    count_empty_batches: bool,

    /// On malformed input, keep what was written, log the error and exit 0.
    #[arg(long)]
    keep_going: bool,
}

impl Args {
    fn into_config(self) -> ConvertConfig {
        let mut config = ConvertConfig::new(self.input, self.schema_file);
        config.output_dir = self.output_dir;
        config.max_records = (self.maxrecords > 0).then_some(self.maxrecords);
        config.batch_size = self.batch_size;
        config.parse = ParseOptions {
            category_reentry: if self.append_repeated_categories {
                CategoryReentry::Append
            } else {
                CategoryReentry::Replace
            },
            error_policy: if self.keep_going {
                ErrorPolicy::LogAndStop
            } else {
                ErrorPolicy::Propagate
            },
        };
        config.writer = WriterOptions {
            table_prefix: self.table_prefix,
            count_empty_batches: self.count_empty_batches,
        };
        config
    }
}

fn main() -> Result<()> {
    logging::init(LogLevel::Info);

    let config = Args::parse().into_config();

    let summary = xml_to_csv_batches(&config)
        .with_context(|| format!("failed to convert {}", config.input.display()))?;

    match &summary.stop {
        StopReason::EndOfInput => {}
        StopReason::LimitReached { count } => {
            tracing::info!("Record limit reached after {} records", count)
        }
        StopReason::Aborted(reason) => tracing::warn!("Conversion aborted: {}", reason),
    }
    tracing::info!(
        "Done: {} records, {} rows in {} files",
        summary.records,
        summary.rows_written,
        summary.files_written
    );
    Ok(())
}
