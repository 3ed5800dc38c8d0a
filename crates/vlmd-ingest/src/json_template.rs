use std::io::Read;
use std::path::Path;

use serde_json::Value;
use tracing::info;
use vlmd_core::views::FIELDS_KEY;
use vlmd_model::{DataDictionary, DictionaryProps, Field};

use crate::adapter::{SourceAdapter, resolve_props};
use crate::csv_table::open_input;
use crate::error::IngestError;
use crate::kind::InputKind;

/// Reads a JSON data dictionary template: `{title?, description?,
/// data_dictionary}` or a bare array of fields. Fields without a type are
/// strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonTemplateAdapter;

impl SourceAdapter for JsonTemplateAdapter {
    fn kind(&self) -> InputKind {
        InputKind::JsonTemplate
    }

    fn extract(
        &self,
        path: &Path,
        props: &DictionaryProps,
        default_title: &str,
    ) -> Result<DataDictionary, IngestError> {
        let mut text = String::new();
        open_input(path)?.read_to_string(&mut text)?;
        let document: Value = serde_json::from_str(&text).map_err(|source| IngestError::Json {
            path: path.to_path_buf(),
            source,
        })?;

        let (fields_value, declared_title, declared_description) = match document {
            Value::Array(_) => (document, None, None),
            Value::Object(mut object) => {
                let fields = object.remove(FIELDS_KEY).ok_or_else(|| {
                    IngestError::invalid_template(path, format!("no '{FIELDS_KEY}' array"))
                })?;
                let text_of = |value: Option<Value>| match value {
                    Some(Value::String(text)) => Some(text),
                    _ => None,
                };
                (
                    fields,
                    text_of(object.remove("title")),
                    text_of(object.remove("description")),
                )
            }
            _ => {
                return Err(IngestError::invalid_template(
                    path,
                    "expected an object or an array of fields",
                ));
            }
        };

        let fields: Vec<Field> = serde_json::from_value(fields_value)
            .map_err(|e| IngestError::invalid_template(path, e.to_string()))?;
        let (title, description) =
            resolve_props(props, declared_title, declared_description, default_title);
        info!(
            path = %path.display(),
            field_count = fields.len(),
            "read json template"
        );
        Ok(DataDictionary::new(title, fields).with_description(description))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use vlmd_model::{FieldType, Scalar};

    use super::*;

    fn template(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn object_template_keeps_declared_title() {
        let file = template(
            r#"{"title": "Declared", "description": "About",
                "data_dictionary": [
                    {"name": "q1", "type": "integer", "encodings": {"1": "Yes", "0": "No"}},
                    {"name": "q2"}
                ]}"#,
        );
        let dictionary = JsonTemplateAdapter
            .extract(file.path(), &DictionaryProps::new(), "stem")
            .unwrap();
        assert_eq!(dictionary.title, "Declared");
        assert_eq!(dictionary.description.as_deref(), Some("About"));
        assert_eq!(
            dictionary.fields()[0].encodings.get(&Scalar::Integer(1)),
            Some("Yes")
        );
        assert_eq!(dictionary.fields()[1].field_type, FieldType::String);
    }

    #[test]
    fn bare_array_uses_default_title() {
        let file = template(r#"[{"name": "a", "type": "number"}]"#);
        let dictionary = JsonTemplateAdapter
            .extract(file.path(), &DictionaryProps::new(), "stem")
            .unwrap();
        assert_eq!(dictionary.title, "stem");
        assert_eq!(dictionary.fields().len(), 1);
    }

    #[test]
    fn scalar_document_is_invalid() {
        let file = template("42");
        assert!(matches!(
            JsonTemplateAdapter.extract(file.path(), &DictionaryProps::new(), "stem"),
            Err(IngestError::InvalidTemplate { .. })
        ));
    }

    #[test]
    fn malformed_json_is_reported() {
        let file = template("{not json");
        assert!(matches!(
            JsonTemplateAdapter.extract(file.path(), &DictionaryProps::new(), "stem"),
            Err(IngestError::Json { .. })
        ));
    }
}
