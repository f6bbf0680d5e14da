use indexmap::IndexMap;

/// Key under which every row carries the id of the `alrovat` it came from.
pub const SUBCATEGORY_ID_KEY: &str = "subcategory_id";

/// Key injected into every row when a document is spread into tables.
pub const RECORD_ID_KEY: &str = "record_id";

/// One flat row: field name to accumulated text, in the order the fields
/// were first opened.
pub type Row = IndexMap<String, String>;

/// One completed `ceg` element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub record_id: String,
    pub categories: IndexMap<String, Vec<Row>>,
}

impl Document {
    pub fn new(record_id: impl Into<String>) -> Self {
        Self {
            record_id: record_id.into(),
            categories: IndexMap::new(),
        }
    }

    pub fn category(&self, category_id: &str) -> Option<&[Row]> {
        self.categories.get(category_id).map(Vec::as_slice)
    }

    pub fn row_count(&self) -> usize {
        self.categories.values().map(Vec::len).sum()
    }
}

/// Builds a row from literal pairs. Mostly useful when constructing
/// expected documents.
pub fn row<K, V, I>(pairs: I) -> Row
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
