//! Core data structures for the editable column table.

use crate::error::{CatalogError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One column of the loaded table, plus the texts the wizard collects for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRecord {
    /// Column name as stored in the catalog
    pub column_name: String,

    /// Type as reported by `format_type`, e.g. `character varying(255)`
    pub data_type: String,

    /// Catalog attribute number; defines the row order
    pub ordinal_position: i32,

    /// Comment already stored in the database, if any
    pub current_description: Option<String>,

    /// Text drafted by the language model
    pub llm_suggestion: Option<String>,

    /// Text the user approved; only meaningful once comments are confirmed
    pub final_comment: Option<String>,
}

impl ColumnRecord {
    pub fn new(
        column_name: impl Into<String>,
        data_type: impl Into<String>,
        ordinal_position: i32,
        current_description: Option<String>,
    ) -> Self {
        Self {
            column_name: column_name.into(),
            data_type: data_type.into(),
            ordinal_position,
            current_description,
            llm_suggestion: None,
            final_comment: None,
        }
    }

    /// True when the database holds no usable comment for this column.
    pub fn lacks_description(&self) -> bool {
        self.current_description
            .as_deref()
            .is_none_or(|d| d.trim().is_empty())
    }

    /// Existing description first, then the model's suggestion.
    pub fn default_comment(&self) -> Option<&str> {
        self.current_description
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .or(self.llm_suggestion.as_deref())
    }

    /// The approved comment if it is non-empty.
    pub fn approved_comment(&self) -> Option<&str> {
        self.final_comment.as_deref().filter(|c| !c.is_empty())
    }
}

/// Ordered, editable set of columns for one `(schema, table)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingSet {
    columns: Vec<ColumnRecord>,
}

impl WorkingSet {
    /// Build a working set, sorting by ordinal position and rejecting
    /// duplicate column names.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Query`] if two columns share a name.
    pub fn new(mut columns: Vec<ColumnRecord>) -> Result<Self> {
        columns.sort_by_key(|c| c.ordinal_position);

        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.column_name.as_str()) {
                return Err(CatalogError::Query(format!(
                    "duplicate column '{}' in catalog result",
                    column.column_name
                )));
            }
        }

        Ok(Self { columns })
    }

    pub fn columns(&self) -> &[ColumnRecord] {
        &self.columns
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ColumnRecord> {
        self.columns.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, ColumnRecord> {
        self.columns.iter_mut()
    }

    pub fn get(&self, column_name: &str) -> Option<&ColumnRecord> {
        self.columns.iter().find(|c| c.column_name == column_name)
    }

    pub fn get_mut(&mut self, column_name: &str) -> Option<&mut ColumnRecord> {
        self.columns
            .iter_mut()
            .find(|c| c.column_name == column_name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.column_name.as_str()).collect()
    }

    pub fn missing_descriptions(&self) -> usize {
        self.columns.iter().filter(|c| c.lacks_description()).count()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl<'a> IntoIterator for &'a WorkingSet {
    type Item = &'a ColumnRecord;
    type IntoIter = std::slice::Iter<'a, ColumnRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a> IntoIterator for &'a mut WorkingSet {
    type Item = &'a mut ColumnRecord;
    type IntoIter = std::slice::IterMut<'a, ColumnRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_working_set_orders_by_ordinal() {
        let ws = WorkingSet::new(vec![
            ColumnRecord::new("email", "character varying", 2, None),
            ColumnRecord::new("id", "integer", 1, Some("Primary key".to_owned())),
        ])
        .unwrap();

        assert_eq!(ws.column_names(), vec!["id", "email"]);
        assert_eq!(ws.missing_descriptions(), 1);
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let result = WorkingSet::new(vec![
            ColumnRecord::new("id", "integer", 1, None),
            ColumnRecord::new("id", "bigint", 2, None),
        ]);
        assert!(matches!(result, Err(CatalogError::Query(_))));
    }

    #[test]
    fn test_default_comment_prefers_existing_description() {
        let mut col = ColumnRecord::new("id", "integer", 1, Some("Row id".to_owned()));
        col.llm_suggestion = Some("Identifier".to_owned());
        assert_eq!(col.default_comment(), Some("Row id"));

        col.current_description = None;
        assert_eq!(col.default_comment(), Some("Identifier"));
    }

    #[test]
    fn test_blank_description_counts_as_missing() {
        let col = ColumnRecord::new("note", "text", 3, Some("   ".to_owned()));
        assert!(col.lacks_description());
        assert_eq!(col.default_comment(), None);
    }

    #[test]
    fn test_approved_comment_ignores_empty() {
        let mut col = ColumnRecord::new("id", "integer", 1, None);
        col.final_comment = Some(String::new());
        assert_eq!(col.approved_comment(), None);
        col.final_comment = Some("Key".to_owned());
        assert_eq!(col.approved_comment(), Some("Key"));
    }
}
