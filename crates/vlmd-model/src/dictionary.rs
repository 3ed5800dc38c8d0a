use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::field::Field;

/// Dictionary-level properties supplied by the caller.
///
/// Build a fresh value for every conversion; nothing here is shared between calls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DictionaryProps {
    pub title: Option<String>,
    pub description: Option<String>,
}

impl DictionaryProps {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = non_blank(title.into());
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = non_blank(description.into());
        self
    }
}

fn non_blank(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Canonical data dictionary: dictionary properties plus ordered fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataDictionary {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub data_dictionary: Vec<Field>,
}

impl DataDictionary {
    pub fn new(title: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            title: title.into(),
            description: None,
            data_dictionary: fields,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    pub fn fields(&self) -> &[Field] {
        &self.data_dictionary
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.data_dictionary.iter().find(|field| field.name == name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.data_dictionary.iter().map(|field| field.name.as_str())
    }

    /// Names that occur more than once, in first-seen order.
    pub fn duplicate_names(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        let mut duplicates = Vec::new();
        for name in self.field_names() {
            if !seen.insert(name) && !duplicates.iter().any(|dup| dup == name) {
                duplicates.push(name.to_string());
            }
        }
        duplicates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldType;

    #[test]
    fn props_ignore_blank_values() {
        let props = DictionaryProps::new().with_title(" ").with_description("Survey");
        assert_eq!(props.title, None);
        assert_eq!(props.description.as_deref(), Some("Survey"));
    }

    #[test]
    fn duplicate_names_reported_once() {
        let dictionary = DataDictionary::new(
            "dd",
            vec![
                Field::new("a", FieldType::String),
                Field::new("b", FieldType::String),
                Field::new("a", FieldType::Integer),
                Field::new("a", FieldType::Number),
            ],
        );
        assert_eq!(dictionary.duplicate_names(), vec!["a".to_string()]);
        assert_eq!(
            dictionary.field("b").map(|f| f.field_type),
            Some(FieldType::String)
        );
    }
}
