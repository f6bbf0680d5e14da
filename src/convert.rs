use crate::error::Result;
use crate::parser::{FileProcessor, ParseOptions, StopReason};
use crate::processors::{Batcher, RecordLimiter};
use crate::schema::Schema;
use crate::splitter::{CsvSplitter, WriterOptions};
use flate2::read::MultiGzDecoder;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

pub const DEFAULT_BATCH_SIZE: usize = 1000;
pub const DEFAULT_OUTPUT_DIR: &str = "output";

#[derive(Debug, Clone)]
pub struct ConvertConfig {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub schema_file: PathBuf,
    /// Stop after this many records; `None` converts everything.
    pub max_records: Option<usize>,
    pub batch_size: usize,
    pub parse: ParseOptions,
    pub writer: WriterOptions,
}

impl ConvertConfig {
    pub fn new(input: impl Into<PathBuf>, schema_file: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            schema_file: schema_file.into(),
            max_records: None,
            batch_size: DEFAULT_BATCH_SIZE,
            parse: ParseOptions::default(),
            writer: WriterOptions::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertSummary {
    pub records: usize,
    pub stop: StopReason,
    pub batches_written: usize,
    pub files_written: usize,
    pub rows_written: usize,
}

/// Opens `path` for reading, decompressing when the name ends in `.gz`.
pub fn open_input(path: &Path) -> Result<Box<dyn BufRead>> {
    let file = File::open(path)?;
    if path.extension().is_some_and(|ext| ext == "gz") {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Creates the output directory and one sub-directory per schema table.
pub fn prepare_output_dirs(output_dir: &Path, schema: &Schema) -> Result<()> {
    fs::create_dir_all(output_dir)?;
    for table in schema.tables() {
        fs::create_dir_all(output_dir.join(&table.name))?;
    }
    Ok(())
}

/// Loads the schema named in `config` and converts the input file.
pub fn xml_to_csv_batches(config: &ConvertConfig) -> Result<ConvertSummary> {
    let schema = Schema::load_from_file(&config.schema_file)?;
    convert_with_schema(config, schema)
}

pub fn convert_with_schema(config: &ConvertConfig, schema: Schema) -> Result<ConvertSummary> {
    prepare_output_dirs(&config.output_dir, &schema)?;

    let splitter = CsvSplitter::with_options(
        &config.input,
        &config.output_dir,
        schema,
        config.writer.clone(),
    );
    let mut batcher = Batcher::new(config.batch_size, splitter);

    tracing::info!("Converting {}", config.input.display());
    let input = open_input(&config.input)?;
    let outcome = match config.max_records.filter(|&max| max > 0) {
        Some(max) => {
            tracing::warn!("Record limit active: stopping after {} records", max);
            FileProcessor::with_options(RecordLimiter::new(&mut batcher, max), config.parse)
                .process(input)?
        }
        None => FileProcessor::with_options(&mut batcher, config.parse).process(input)?,
    };

    let stats = batcher.batch_processor().stats();
    tracing::info!(
        "Converted {}: {} records, {} files in {} batches",
        config.input.display(),
        outcome.records,
        stats.files_written,
        stats.batches_written
    );

    Ok(ConvertSummary {
        records: outcome.records,
        stop: outcome.stop,
        batches_written: stats.batches_written,
        files_written: stats.files_written,
        rows_written: stats.rows_written,
    })
}
