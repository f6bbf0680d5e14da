use crate::types::{Document, Row, SUBCATEGORY_ID_KEY};

/// What happens when a `rovat` id shows up twice inside one `ceg`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CategoryReentry {
    /// The second occurrence starts over with an empty row list.
    #[default]
    Replace,
    /// Rows of later occurrences are appended to the earlier ones.
    Append,
}

/// Per-record parser state: the document being built and the cursor into it.
///
/// One builder lives for exactly one `ceg`; [`RecordBuilder::finish_record`]
/// hands out the document and leaves a fresh builder behind. Calls that need
/// an enclosing element which is not open are ignored; the hierarchy
/// validator guarantees that cannot happen while parsing.
#[derive(Debug, Default)]
pub struct RecordBuilder {
    reentry: CategoryReentry,
    document: Option<Document>,
    category: Option<String>,
    field: Option<String>,
}

impl RecordBuilder {
    pub fn new(reentry: CategoryReentry) -> Self {
        Self {
            reentry,
            ..Self::default()
        }
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    pub fn current_category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn current_field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    pub fn current_row(&self) -> Option<&Row> {
        let category = self.category.as_ref()?;
        self.document.as_ref()?.categories.get(category)?.last()
    }

    fn current_row_mut(&mut self) -> Option<&mut Row> {
        let category = self.category.as_ref()?;
        self.document
            .as_mut()?
            .categories
            .get_mut(category)?
            .last_mut()
    }

    pub fn start_record(&mut self, record_id: &str) {
        self.document = Some(Document::new(record_id));
        self.category = None;
        self.field = None;
    }

    pub fn start_category(&mut self, category_id: &str) {
        let Some(document) = self.document.as_mut() else {
            return;
        };
        match self.reentry {
            CategoryReentry::Replace => {
                document
                    .categories
                    .insert(category_id.to_string(), Vec::new());
            }
            CategoryReentry::Append => {
                document
                    .categories
                    .entry(category_id.to_string())
                    .or_default();
            }
        }
        self.category = Some(category_id.to_string());
        self.field = None;
    }

    pub fn start_subcategory(&mut self, subcategory_id: &str) {
        let Some(category) = self.category.as_ref() else {
            return;
        };
        let Some(rows) = self
            .document
            .as_mut()
            .and_then(|document| document.categories.get_mut(category))
        else {
            return;
        };
        let mut row = Row::new();
        row.insert(SUBCATEGORY_ID_KEY.to_string(), subcategory_id.to_string());
        rows.push(row);
        self.field = None;
    }

    /// Opens a field; a field opened twice in one row starts over empty.
    pub fn start_field(&mut self, field_id: &str) {
        let Some(row) = self.current_row_mut() else {
            return;
        };
        row.insert(field_id.to_string(), String::new());
        self.field = Some(field_id.to_string());
    }

    pub fn append_text(&mut self, text: &str) {
        let Some(field) = self.field.clone() else {
            return;
        };
        if let Some(value) = self.current_row_mut().and_then(|row| row.get_mut(&field)) {
            value.push_str(text);
        }
    }

    /// Appends `\n` to the most recently opened field of the current row.
    /// Returns `false` when the row has no field yet.
    pub fn line_break(&mut self) -> bool {
        let Some(field) = self.field.clone() else {
            return false;
        };
        match self.current_row_mut().and_then(|row| row.get_mut(&field)) {
            Some(value) => {
                value.push('\n');
                true
            }
            None => false,
        }
    }

    /// Takes the finished document and resets the builder for the next record.
    pub fn finish_record(&mut self) -> Option<Document> {
        let reentry = self.reentry;
        let finished = std::mem::replace(self, RecordBuilder::new(reentry));
        finished.document
    }
}
