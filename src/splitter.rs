use crate::error::{ConvertError, Result};
use crate::processors::BatchProcessor;
use crate::schema::Schema;
use crate::types::{Document, Row, RECORD_ID_KEY};
use indexmap::IndexMap;
use std::fs::OpenOptions;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

pub const DEFAULT_TABLE_PREFIX: &str = "table_";

/// Largest batch number whose file name keeps name order equal to write order.
pub const MAX_BATCH_NUMBER: usize = 9999;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriterOptions {
    /// Prepended to the normalised category id to form the table name.
    pub table_prefix: String,
    /// Advance the batch number even when a batch produced no files.
    pub count_empty_batches: bool,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            table_prefix: DEFAULT_TABLE_PREFIX.to_string(),
            count_empty_batches: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriterStats {
    pub batches_written: usize,
    pub files_written: usize,
    pub rows_written: usize,
}

/// Strips leading zeros from purely numeric category ids; `"000"` becomes `"0"`.
pub fn normalize_category(category: &str) -> &str {
    if category.is_empty() || !category.bytes().all(|b| b.is_ascii_digit()) {
        return category;
    }
    match category.trim_start_matches('0') {
        "" => "0",
        trimmed => trimmed,
    }
}

pub fn table_name(prefix: &str, category: &str) -> String {
    format!("{prefix}{}", normalize_category(category))
}

/// File name of `input` without a trailing `.gz` and then `.xml`.
pub fn base_name(input: &Path) -> String {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stripped = name.strip_suffix(".gz").unwrap_or(&name);
    let stripped = stripped.strip_suffix(".xml").unwrap_or(stripped);
    stripped.to_string()
}

/// Flattens one document into `tables`, tagging each row with the record id.
pub fn spread_record(tables: &mut IndexMap<String, Vec<Row>>, document: Document) {
    let Document {
        record_id,
        categories,
    } = document;
    for (category, rows) in categories {
        let accumulated = tables.entry(category).or_default();
        accumulated.extend(rows.into_iter().map(|mut row| {
            row.insert(RECORD_ID_KEY.to_string(), record_id.clone());
            row
        }));
    }
}

struct TableBatch<'s> {
    category: String,
    columns: &'s [String],
    rows: Vec<Row>,
}

/// Writes each batch of documents as one CSV file per table:
/// `<output_dir>/<table>/<base_name>_<NNNN>.csv`.
#[derive(Debug)]
pub struct CsvSplitter {
    schema: Schema,
    output_dir: PathBuf,
    base_name: String,
    batch_number: usize,
    options: WriterOptions,
    stats: WriterStats,
}

impl CsvSplitter {
    pub fn new(input: &Path, output_dir: impl Into<PathBuf>, schema: Schema) -> Self {
        Self::with_options(input, output_dir, schema, WriterOptions::default())
    }

    pub fn with_options(
        input: &Path,
        output_dir: impl Into<PathBuf>,
        schema: Schema,
        options: WriterOptions,
    ) -> Self {
        Self {
            schema,
            output_dir: output_dir.into(),
            base_name: base_name(input),
            batch_number: 0,
            options,
            stats: WriterStats::default(),
        }
    }

    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    pub fn batch_number(&self) -> usize {
        self.batch_number
    }

    pub fn stats(&self) -> WriterStats {
        self.stats
    }

    pub fn table_name(&self, category: &str) -> String {
        table_name(&self.options.table_prefix, category)
    }

    pub fn batch_csv_path(&self, table: &str) -> PathBuf {
        self.output_dir
            .join(table)
            .join(format!("{}_{:04}.csv", self.base_name, self.batch_number))
    }

    /// Groups the spread rows by output table and resolves every table's
    /// columns before anything touches the disk.
    fn plan<'s>(
        schema: &'s Schema,
        prefix: &str,
        spread: IndexMap<String, Vec<Row>>,
    ) -> Result<IndexMap<String, TableBatch<'s>>> {
        let mut planned: IndexMap<String, TableBatch<'s>> = IndexMap::new();
        for (category, rows) in spread {
            if rows.is_empty() {
                continue;
            }
            let table = table_name(prefix, &category);
            if let Some(existing) = planned.get_mut(&table) {
                existing.rows.extend(rows);
                continue;
            }
            let columns = schema
                .columns(&table)
                .ok_or_else(|| ConvertError::SchemaLookup {
                    category: category.clone(),
                    table: table.clone(),
                })?;
            planned.insert(
                table,
                TableBatch {
                    category,
                    columns,
                    rows,
                },
            );
        }
        Ok(planned)
    }

    fn flush_table(&self, table: &str, batch: &TableBatch<'_>) -> Result<()> {
        tracing::debug!("CsvSplitter.flush_table START: {}", table);
        let path = self.batch_csv_path(table);
        let written = write_table(&path, batch.columns, &batch.rows);
        if let Err(err) = &written {
            tracing::error!(
                "{}: category {} batch #{}: {}",
                self.base_name,
                batch.category,
                self.batch_number,
                err
            );
            if let (Some(first), Some(last)) = (batch.rows.first(), batch.rows.last()) {
                tracing::info!(
                    "Record ids {} - {}",
                    first.get(RECORD_ID_KEY).map(String::as_str).unwrap_or(""),
                    last.get(RECORD_ID_KEY).map(String::as_str).unwrap_or("")
                );
            }
        }
        tracing::debug!("CsvSplitter.flush_table END: {}", table);
        written
    }
}

impl BatchProcessor for CsvSplitter {
    fn process(&mut self, batch: Vec<Document>) -> Result<()> {
        tracing::debug!("CsvSplitter.process START: batch #{}", self.batch_number);
        let mut spread = IndexMap::new();
        for document in batch {
            spread_record(&mut spread, document);
        }

        let planned = Self::plan(&self.schema, &self.options.table_prefix, spread)?;
        if !planned.is_empty() && self.batch_number > MAX_BATCH_NUMBER {
            return Err(ConvertError::BatchNumbersExhausted {
                batch: self.batch_number,
                max: MAX_BATCH_NUMBER,
            });
        }
        let mut rows_written = 0;
        for (table, table_batch) in &planned {
            self.flush_table(table, table_batch)?;
            rows_written += table_batch.rows.len();
        }

        let files_written = planned.len();
        self.stats.files_written += files_written;
        self.stats.rows_written += rows_written;
        if files_written > 0 {
            self.stats.batches_written += 1;
        }
        if files_written > 0 || self.options.count_empty_batches {
            self.batch_number += 1;
        }
        tracing::debug!("CsvSplitter.process END: {} files", files_written);
        Ok(())
    }
}

/// Writes a header plus one line per row. Only `columns` are emitted, in
/// order; absent fields are empty. Never overwrites an existing file.
pub fn write_table(path: &Path, columns: &[String], rows: &[Row]) -> Result<()> {
    let file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
            return Err(ConvertError::WriteCollision {
                path: path.to_path_buf(),
            })
        }
        Err(err) => return Err(err.into()),
    };

    let mut writer = csv::Writer::from_writer(BufWriter::new(file));
    writer.write_record(columns)?;
    for row in rows {
        writer.write_record(
            columns
                .iter()
                .map(|column| row.get(column.as_str()).map(String::as_str).unwrap_or("")),
        )?;
    }
    writer.flush()?;
    Ok(())
}
