pub mod builder;
pub mod concat;
pub mod convert;
pub mod error;
pub mod hierarchy;
pub mod logging;
pub mod parser;
pub mod processors;
pub mod schema;
pub mod splitter;
pub mod types;

pub use convert::{xml_to_csv_batches, ConvertConfig, ConvertSummary};
pub use error::{ConvertError, Result};
pub use types::Document;
