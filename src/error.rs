use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("hierarchy problem at byte {position}: {message}")]
    Structural { message: String, position: u64 },

    #[error("<{element}> at byte {position} has no `{attribute}` attribute")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
        position: u64,
    },

    /// Not a failure: the record limit was hit and parsing should stop.
    #[error("{count} required records processed")]
    LimitReached { count: usize },

    #[error("refusing to overwrite existing output file {}", path.display())]
    WriteCollision { path: PathBuf },

    #[error("batch number {batch} does not fit the 4-digit file names (max {max})")]
    BatchNumbersExhausted { batch: usize, max: usize },

    #[error("no table `{table}` in schema (category `{category}`)")]
    SchemaLookup { category: String, table: String },

    #[error("invalid schema: {0}")]
    Schema(String),

    #[error("header of {} differs from the first file ({expected:?} vs {found:?})", path.display())]
    HeaderMismatch {
        path: PathBuf,
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("{} is not a directory", path.display())]
    NotADirectory { path: PathBuf },

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConvertError {
    pub fn structural(message: impl Into<String>, position: u64) -> Self {
        ConvertError::Structural {
            message: message.into(),
            position,
        }
    }

    pub fn is_limit_reached(&self) -> bool {
        matches!(self, ConvertError::LimitReached { .. })
    }
}

pub type Result<T, E = ConvertError> = std::result::Result<T, E>;
