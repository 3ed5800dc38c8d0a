//! Nested (JSON document) view of a dictionary.

use serde_json::Value;
use vlmd_model::{DataDictionary, Field};

use crate::error::ViewError;

/// Key of the field list in the nested document.
pub const FIELDS_KEY: &str = "data_dictionary";

/// Render `{title, description?, data_dictionary}`.
pub fn nested_view(dictionary: &DataDictionary) -> Result<Value, ViewError> {
    Ok(serde_json::to_value(dictionary)?)
}

/// Parse the field list of a nested document.
pub fn nested_fields(view: &Value) -> Result<Vec<Field>, ViewError> {
    let fields = view
        .get(FIELDS_KEY)
        .ok_or_else(|| ViewError::InvalidDocument {
            message: format!("missing '{FIELDS_KEY}'"),
        })?;
    Ok(serde_json::from_value(fields.clone())?)
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use vlmd_model::{FieldType, Scalar};

    use super::*;

    #[test]
    fn empty_attributes_are_omitted() {
        let dictionary = DataDictionary::new(
            "survey",
            vec![
                Field::new("id", FieldType::Integer),
                Field::new("status", FieldType::Integer)
                    .with_missing_values(vec![Scalar::Integer(9)]),
            ],
        );
        assert_eq!(
            nested_view(&dictionary).unwrap(),
            json!({
                "title": "survey",
                "data_dictionary": [
                    {"name": "id", "type": "integer"},
                    {"name": "status", "type": "integer", "missingValues": [9]}
                ]
            })
        );
    }

    #[test]
    fn fields_round_trip() {
        let dictionary = DataDictionary::new(
            "survey",
            vec![Field::new("a", FieldType::String).with_description("A")],
        )
        .with_description(Some("About".to_string()));
        let view = nested_view(&dictionary).unwrap();
        assert_eq!(view["description"], "About");
        assert_eq!(nested_fields(&view).unwrap(), dictionary.data_dictionary);
    }

    #[test]
    fn missing_field_list_is_an_error() {
        assert!(matches!(
            nested_fields(&json!({"title": "x"})),
            Err(ViewError::InvalidDocument { .. })
        ));
    }
}
