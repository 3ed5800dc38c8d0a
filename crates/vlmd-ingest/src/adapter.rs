use std::path::Path;

use vlmd_model::{DataDictionary, DictionaryProps};

use crate::error::IngestError;
use crate::kind::InputKind;

/// Converts one kind of input artifact into a canonical data dictionary.
pub trait SourceAdapter {
    fn kind(&self) -> InputKind;

    /// Read `path` and build its dictionary. `props` take precedence over
    /// anything the artifact declares; `default_title` is the last resort.
    fn extract(
        &self,
        path: &Path,
        props: &DictionaryProps,
        default_title: &str,
    ) -> Result<DataDictionary, IngestError>;
}

/// Title and description after applying caller overrides.
pub(crate) fn resolve_props(
    props: &DictionaryProps,
    declared_title: Option<String>,
    declared_description: Option<String>,
    default_title: &str,
) -> (String, Option<String>) {
    let title = props
        .title
        .clone()
        .or(declared_title.filter(|title| !title.trim().is_empty()))
        .unwrap_or_else(|| default_title.to_string());
    let description = props
        .description
        .clone()
        .or(declared_description.filter(|text| !text.trim().is_empty()));
    (title, description)
}
