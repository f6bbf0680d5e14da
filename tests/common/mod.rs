#![allow(dead_code)]
use complex_xml_to_csvs::processors::{BatchProcessor, RecordProcessor};
use complex_xml_to_csvs::schema::Schema;
use complex_xml_to_csvs::{ConvertError, Document, Result};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub fn fixtures_dir() -> &'static str {
    concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures")
}

pub fn fixture_path(filename: &str) -> PathBuf {
    Path::new(fixtures_dir()).join(filename)
}

pub fn load_fixture(filename: &str) -> String {
    let path = fixture_path(filename);
    fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", path.display(), e))
}

pub fn load_schema() -> Schema {
    Schema::load_from_file(fixture_path("schema.json")).expect("fixture schema should load")
}

/// Copies a fixture into `dir`, gzipped, under `<name>.gz`.
pub fn gzip_fixture(filename: &str, dir: &Path) -> PathBuf {
    let target = dir.join(format!("{filename}.gz"));
    let mut encoder = GzEncoder::new(
        fs::File::create(&target).expect("gz target should be creatable"),
        Compression::default(),
    );
    encoder
        .write_all(load_fixture(filename).as_bytes())
        .expect("gz write should succeed");
    encoder.finish().expect("gz finish should succeed");
    target
}

/// Every line of a CSV file, header included.
pub fn read_csv(path: &Path) -> Vec<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e));
    reader
        .records()
        .map(|record| {
            record
                .expect("csv record should parse")
                .iter()
                .map(str::to_string)
                .collect()
        })
        .collect()
}

pub fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Remembers every call made on it, in order.
#[derive(Debug, Default)]
pub struct RecordingProcessor {
    pub calls: Vec<&'static str>,
    pub documents: Vec<Document>,
}

impl RecordProcessor for RecordingProcessor {
    fn process(&mut self, document: Document) -> Result<()> {
        self.calls.push("process");
        self.documents.push(document);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.calls.push("flush");
        Ok(())
    }
}

/// Fails on every document, as a broken writer would.
#[derive(Debug, Default)]
pub struct FailingProcessor {
    pub flushes: usize,
}

impl RecordProcessor for FailingProcessor {
    fn process(&mut self, _document: Document) -> Result<()> {
        Err(ConvertError::Io(io::Error::other("disk full")))
    }

    fn flush(&mut self) -> Result<()> {
        self.flushes += 1;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct RecordingBatches {
    pub batches: Vec<Vec<Document>>,
}

impl RecordingBatches {
    pub fn record_ids(&self) -> Vec<Vec<String>> {
        self.batches
            .iter()
            .map(|batch| batch.iter().map(|d| d.record_id.clone()).collect())
            .collect()
    }
}

impl BatchProcessor for RecordingBatches {
    fn process(&mut self, batch: Vec<Document>) -> Result<()> {
        self.batches.push(batch);
        Ok(())
    }
}
