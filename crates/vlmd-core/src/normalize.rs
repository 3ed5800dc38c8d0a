//! Canonical field normalization.
//!
//! Combines type inference, missing-value resolution and enum resolution into
//! one [`Field`] per column, in column order.

use std::collections::HashSet;

use polars::prelude::*;
use tracing::{debug, info};
use vlmd_model::{DataDictionary, DictionaryProps, Encodings, Field};

use crate::encoding::resolve_enum;
use crate::error::ResolveError;
use crate::infer::infer_field_type;
use crate::missing::resolve_missing_values;
use crate::values::{RawValue, distinct_values};

/// Metadata a source declares for one variable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariableMetadata {
    pub label: Option<String>,
    /// Value labels in declaration order.
    pub value_labels: Vec<(RawValue, String)>,
    pub missing_values: Vec<RawValue>,
    pub missing_ranges: Vec<(RawValue, RawValue)>,
}

impl VariableMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub fn with_value_label(mut self, value: RawValue, label: impl Into<String>) -> Self {
        self.value_labels.push((value, label.into()));
        self
    }

    #[must_use]
    pub fn with_missing_value(mut self, value: RawValue) -> Self {
        self.missing_values.push(value);
        self
    }

    #[must_use]
    pub fn with_missing_range(mut self, lo: RawValue, hi: RawValue) -> Self {
        self.missing_ranges.push((lo, hi));
        self
    }
}

/// Per-variable metadata keyed by column name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataBundle {
    variables: Vec<(String, VariableMetadata)>,
}

impl MetadataBundle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, metadata: VariableMetadata) {
        let name = name.into();
        match self.variables.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = metadata,
            None => self.variables.push((name, metadata)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&VariableMetadata> {
        self.variables
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, metadata)| metadata)
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}

/// Case data plus declared metadata, as produced by a statistical reader.
#[derive(Debug, Clone)]
pub struct SourceTable {
    pub frame: DataFrame,
    pub metadata: MetadataBundle,
}

impl SourceTable {
    pub fn new(frame: DataFrame, metadata: MetadataBundle) -> Self {
        Self { frame, metadata }
    }
}

/// Build the canonical field for one column.
pub fn normalize_field(
    column: &Column,
    metadata: Option<&VariableMetadata>,
) -> Result<Field, ResolveError> {
    let name = column.name().to_string();
    let field_type = infer_field_type(column);
    let mut field = Field::new(name.clone(), field_type);

    let Some(metadata) = metadata else {
        debug!(field = %name, field_type = %field_type, "no declared metadata");
        return Ok(field);
    };

    if let Some(label) = &metadata.label {
        field = field.with_description(label.trim());
    }

    let missing =
        resolve_missing_values(&name, &metadata.missing_values, &metadata.missing_ranges)?;

    let encodings: Encodings = metadata
        .value_labels
        .iter()
        .map(|(value, label)| (value.to_scalar(), label.clone()))
        .collect();

    let enumeration = if encodings.is_empty() {
        None
    } else {
        resolve_enum(&encodings, &missing, &distinct_values(column))
    };

    debug!(
        field = %name,
        field_type = %field_type,
        label_count = encodings.len(),
        missing_count = missing.len(),
        enum_attached = enumeration.is_some(),
        "field normalized"
    );

    field = field
        .with_encodings(encodings)
        .with_missing_values(missing);
    if let Some(values) = enumeration {
        field = field.with_enum(values);
    }
    Ok(field)
}

/// Convert a source table into a data dictionary.
///
/// The title is taken from `props`, else `default_title` (normally the file
/// stem). Dataset labels embedded in the source are not used.
pub fn normalize_dictionary(
    table: &SourceTable,
    props: &DictionaryProps,
    default_title: &str,
) -> Result<DataDictionary, ResolveError> {
    let mut seen = HashSet::new();
    let mut fields = Vec::with_capacity(table.frame.width());
    for column in table.frame.get_columns() {
        let name = column.name().as_str();
        if !seen.insert(name.to_string()) {
            return Err(ResolveError::DuplicateField {
                name: name.to_string(),
            });
        }
        fields.push(normalize_field(column, table.metadata.get(name))?);
    }

    let title = props
        .title
        .clone()
        .unwrap_or_else(|| default_title.to_string());
    let enum_count = fields.iter().filter(|f| f.enum_values().is_some()).count();
    info!(
        title = %title,
        field_count = fields.len(),
        enum_count,
        row_count = table.frame.height(),
        "dictionary normalized"
    );
    Ok(DataDictionary::new(title, fields).with_description(props.description.clone()))
}

#[cfg(test)]
mod tests {
    use vlmd_model::{FieldType, Scalar};

    use super::*;

    fn frame() -> DataFrame {
        DataFrame::new(vec![
            Series::new("a".into(), &[Some(1.0), Some(2.0), Some(2.0), Some(9.0)]).into(),
            Series::new("b".into(), &[Some(1.5), None, Some(3.0), Some(4.0)]).into(),
        ])
        .unwrap()
    }

    #[test]
    fn enum_attached_when_observed_values_are_labelled() {
        let mut metadata = MetadataBundle::new();
        metadata.insert(
            "a",
            VariableMetadata::new()
                .with_label("Answer")
                .with_value_label(RawValue::Number(1.0), "Yes")
                .with_value_label(RawValue::Number(2.0), "No")
                .with_value_label(RawValue::Number(9.0), "Refused")
                .with_missing_value(RawValue::Number(9.0)),
        );
        let table = SourceTable::new(frame(), metadata);
        let dictionary = normalize_dictionary(&table, &DictionaryProps::new(), "survey").unwrap();

        assert_eq!(dictionary.title, "survey");
        let a = dictionary.field("a").unwrap();
        assert_eq!(a.field_type, FieldType::Integer);
        assert_eq!(a.description.as_deref(), Some("Answer"));
        assert_eq!(a.encodings.len(), 3);
        assert_eq!(a.missing_values, vec![Scalar::Integer(9)]);
        assert_eq!(
            a.enum_values(),
            Some(&[Scalar::Integer(1), Scalar::Integer(2)][..])
        );

        let b = dictionary.field("b").unwrap();
        assert_eq!(b.field_type, FieldType::Number);
        assert!(b.encodings.is_empty());
        assert!(b.missing_values.is_empty());
        assert_eq!(b.enum_values(), None);
    }

    #[test]
    fn range_error_stops_normalization() {
        let mut metadata = MetadataBundle::new();
        metadata.insert(
            "b",
            VariableMetadata::new().with_missing_range(RawValue::Number(1.0), RawValue::Number(5.0)),
        );
        let table = SourceTable::new(frame(), metadata);
        let err = normalize_dictionary(&table, &DictionaryProps::new(), "x").unwrap_err();
        assert!(matches!(
            err,
            ResolveError::UnsupportedMissingRange { ref field, .. } if field == "b"
        ));
    }

    #[test]
    fn title_precedence() {
        let table = SourceTable::new(frame(), MetadataBundle::new());

        let dictionary = normalize_dictionary(&table, &DictionaryProps::new(), "file").unwrap();
        assert_eq!(dictionary.title, "file");

        let props = DictionaryProps::new()
            .with_title("Given")
            .with_description("About");
        let dictionary = normalize_dictionary(&table, &props, "file").unwrap();
        assert_eq!(dictionary.title, "Given");
        assert_eq!(dictionary.description.as_deref(), Some("About"));
    }
}
