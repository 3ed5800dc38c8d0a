//! Tabular and nested renderings of one canonical field list.

pub mod cells;
pub mod nested;
pub mod tabular;

pub use nested::{FIELDS_KEY, nested_fields, nested_view};
pub use tabular::{TABULAR_HEADERS, TabularView, row_number};

use vlmd_model::DataDictionary;

use crate::error::ViewError;

/// Both views of a dictionary, rendered from the same field list.
#[derive(Debug, Clone, PartialEq)]
pub struct DictionaryViews {
    pub tabular: TabularView,
    pub nested: serde_json::Value,
}

pub fn build_views(dictionary: &DataDictionary) -> Result<DictionaryViews, ViewError> {
    Ok(DictionaryViews {
        tabular: TabularView::from_fields(dictionary.fields())?,
        nested: nested_view(dictionary)?,
    })
}
