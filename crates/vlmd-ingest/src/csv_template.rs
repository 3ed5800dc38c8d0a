use std::path::Path;

use tracing::info;
use vlmd_core::TabularView;
use vlmd_core::views::tabular::NAME;
use vlmd_model::{DataDictionary, DictionaryProps};

use crate::adapter::{SourceAdapter, resolve_props};
use crate::csv_table::read_csv_table;
use crate::error::IngestError;
use crate::kind::InputKind;

/// Reads a tabular data dictionary template.
///
/// Headers are matched after trimming; unknown columns are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvTemplateAdapter;

impl SourceAdapter for CsvTemplateAdapter {
    fn kind(&self) -> InputKind {
        InputKind::CsvTemplate
    }

    fn extract(
        &self,
        path: &Path,
        props: &DictionaryProps,
        default_title: &str,
    ) -> Result<DataDictionary, IngestError> {
        let table = read_csv_table(path)?;
        if table.column_index(NAME).is_none() {
            return Err(IngestError::invalid_template(
                path,
                format!("no '{NAME}' column in header"),
            ));
        }
        let view = TabularView {
            headers: table.headers,
            rows: table.rows,
        };
        let fields = view.to_fields()?;
        let (title, description) = resolve_props(props, None, None, default_title);
        info!(
            path = %path.display(),
            field_count = fields.len(),
            "read csv template"
        );
        Ok(DataDictionary::new(title, fields).with_description(description))
    }
}
