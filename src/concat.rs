//! Joins the numbered batch files of one table directory into a single CSV
//! next to it, then removes the directory.

use crate::error::{ConvertError, Result};
use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConcatOutcome {
    /// The directory had no files and was removed.
    Empty { dir: PathBuf },
    Written {
        path: PathBuf,
        files: usize,
        rows: usize,
    },
}

/// Batch files of `dir` in the order they were written.
///
/// Batch numbers are zero-padded, so name order is creation order.
pub fn batch_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "csv") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// `out/table_0` becomes `out/table_0.csv`.
pub fn concatenated_path(dir: &Path) -> Result<PathBuf> {
    let name = dir.file_name().ok_or_else(|| ConvertError::NotADirectory {
        path: dir.to_path_buf(),
    })?;
    Ok(dir.with_file_name(format!("{}.csv", name.to_string_lossy())))
}

pub fn concat_table_dir(dir: &Path) -> Result<ConcatOutcome> {
    if !dir.is_dir() {
        return Err(ConvertError::NotADirectory {
            path: dir.to_path_buf(),
        });
    }

    let files = batch_files(dir)?;
    if files.is_empty() {
        fs::remove_dir(dir)?;
        tracing::warn!("{} was empty", dir.display());
        return Ok(ConcatOutcome::Empty {
            dir: dir.to_path_buf(),
        });
    }

    let target = concatenated_path(dir)?;
    let rows = match write_concatenated(&target, &files) {
        Ok(rows) => rows,
        Err(err) => {
            if !matches!(err, ConvertError::WriteCollision { .. }) {
                let _ = fs::remove_file(&target);
            }
            return Err(err);
        }
    };

    fs::remove_dir_all(dir)?;
    tracing::info!(
        "Wrote {} ({} rows from {} files)",
        target.display(),
        rows,
        files.len()
    );
    Ok(ConcatOutcome::Written {
        path: target,
        files: files.len(),
        rows,
    })
}

fn write_concatenated(target: &Path, files: &[PathBuf]) -> Result<usize> {
    let out = match OpenOptions::new().write(true).create_new(true).open(target) {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
            return Err(ConvertError::WriteCollision {
                path: target.to_path_buf(),
            })
        }
        Err(err) => return Err(err.into()),
    };
    let mut writer = csv::Writer::from_writer(BufWriter::new(out));

    let mut expected: Option<Vec<String>> = None;
    let mut rows = 0;
    for file in files {
        let mut reader = csv::Reader::from_path(file)?;
        let header: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        match &expected {
            None => {
                writer.write_record(&header)?;
                expected = Some(header);
            }
            Some(first) if *first != header => {
                return Err(ConvertError::HeaderMismatch {
                    path: file.clone(),
                    expected: first.clone(),
                    found: header,
                });
            }
            Some(_) => {}
        }
        for record in reader.records() {
            writer.write_record(&record?)?;
            rows += 1;
        }
    }
    writer.flush()?;
    Ok(rows)
}
