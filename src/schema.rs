use crate::error::{ConvertError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// One output table and its columns, in output order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub columns: Vec<String>,
}

impl Table {
    pub fn new<I, S>(name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SchemaFile {
    tables: Vec<Table>,
}

/// Table definitions accompanying an export, looked up by table name.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    tables: Vec<Table>,
    by_name: HashMap<String, usize>,
}

impl Schema {
    pub fn from_tables(tables: Vec<Table>) -> Result<Self> {
        let mut by_name = HashMap::with_capacity(tables.len());
        for (idx, table) in tables.iter().enumerate() {
            if by_name.insert(table.name.clone(), idx).is_some() {
                return Err(ConvertError::Schema(format!(
                    "table `{}` is defined more than once",
                    table.name
                )));
            }
        }
        Ok(Self { tables, by_name })
    }

    /// Reads `{"tables": [{"name": ..., "columns": [...]}, ...]}`.
    pub fn from_json(json: &str) -> Result<Self> {
        let file: SchemaFile = serde_json::from_str(json)?;
        Self::from_tables(file.tables)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ConvertError::Schema(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_json(&content)
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.by_name.get(name).map(|&idx| &self.tables[idx])
    }

    pub fn columns(&self, table_name: &str) -> Option<&[String]> {
        self.table(table_name).map(|table| table.columns.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tables_in_file_order() {
        let schema = Schema::from_json(
            r#"{"tables": [
                {"name": "table_0", "columns": ["record_id", "subcategory_id", "bir"]},
                {"name": "table_a", "columns": ["record_id", "subcategory_id", "a"]}
            ]}"#,
        )
        .unwrap();

        let names: Vec<_> = schema.tables().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["table_0", "table_a"]);
        assert_eq!(
            schema.columns("table_0"),
            Some(&["record_id".to_string(), "subcategory_id".into(), "bir".into()][..])
        );
        assert!(schema.table("table_9").is_none());
    }

    #[test]
    fn rejects_duplicate_table_names() {
        let err = Schema::from_tables(vec![
            Table::new("table_a", ["a"]),
            Table::new("table_a", ["b"]),
        ])
        .unwrap_err();
        assert!(matches!(err, ConvertError::Schema(_)));
    }

    #[test]
    fn reports_missing_file() {
        let err = Schema::load_from_file("/nonexistent/schema.json").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/schema.json"));
    }
}
