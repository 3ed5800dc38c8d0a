//! Shape rules shared by both validators.
//!
//! Each rule takes an attribute as a JSON value and either casts it into its
//! model type or describes the violation.

use serde_json::Value;
use vlmd_model::{Encodings, ErrorCode, FieldType, Scalar};

/// A rule violation, before a location is attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub code: ErrorCode,
    pub message: String,
}

impl Violation {
    fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Non-empty field name.
pub fn name(value: &Value) -> Result<String, Violation> {
    match value {
        Value::String(text) if text.trim().is_empty() => {
            Err(Violation::new(ErrorCode::MissingValue, "name is required"))
        }
        Value::String(text) => Ok(text.trim().to_string()),
        other => Err(Violation::new(
            ErrorCode::TypeError,
            format!("name must be a string, got {}", json_kind(other)),
        )),
    }
}

pub fn field_type(value: &Value) -> Result<FieldType, Violation> {
    let Value::String(text) = value else {
        return Err(Violation::new(
            ErrorCode::TypeError,
            format!("type must be a string, got {}", json_kind(value)),
        ));
    };
    if text.trim().is_empty() {
        return Err(Violation::new(ErrorCode::MissingValue, "type is required"));
    }
    text.parse().map_err(|_| {
        Violation::new(
            ErrorCode::TypeError,
            format!(
                "type '{text}' is not one of: {}",
                FieldType::accepted_names()
            ),
        )
    })
}

pub fn description(value: &Value) -> Result<Option<String>, Violation> {
    match value {
        Value::String(text) if text.trim().is_empty() => Ok(None),
        Value::String(text) => Ok(Some(text.clone())),
        other => Err(Violation::new(
            ErrorCode::TypeError,
            format!("description must be a string, got {}", json_kind(other)),
        )),
    }
}

/// Object of string labels keyed by the stored value's text.
pub fn encodings(value: &Value) -> Result<Encodings, Violation> {
    let Value::Object(map) = value else {
        return Err(Violation::new(
            ErrorCode::TypeError,
            format!("encodings must be an object, got {}", json_kind(value)),
        ));
    };
    if map.is_empty() {
        return Err(Violation::new(
            ErrorCode::ConstraintError,
            "encodings must not be empty",
        ));
    }
    let mut encodings = Encodings::new();
    for (key, label) in map {
        let Value::String(label) = label else {
            return Err(Violation::new(
                ErrorCode::TypeError,
                format!(
                    "label of encoding '{key}' must be a string, got {}",
                    json_kind(label)
                ),
            ));
        };
        encodings.insert(Scalar::parse_text(key), label.clone());
    }
    Ok(encodings)
}

/// Non-empty array of numbers and strings.
pub fn scalar_list(attribute: &str, value: &Value) -> Result<Vec<Scalar>, Violation> {
    let Value::Array(items) = value else {
        return Err(Violation::new(
            ErrorCode::TypeError,
            format!("{attribute} must be an array, got {}", json_kind(value)),
        ));
    };
    if items.is_empty() {
        return Err(Violation::new(
            ErrorCode::ConstraintError,
            format!("{attribute} must not be empty"),
        ));
    }
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            scalar(item).ok_or_else(|| {
                Violation::new(
                    ErrorCode::TypeError,
                    format!(
                        "{attribute}[{index}] must be a number or a string, got {}",
                        json_kind(item)
                    ),
                )
            })
        })
        .collect()
}

fn scalar(value: &Value) -> Option<Scalar> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .map(Scalar::Integer)
            .or_else(|| number.as_f64().map(Scalar::Number)),
        Value::String(text) => Some(Scalar::String(text.clone())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn type_violations() {
        assert_eq!(field_type(&json!("Integer")), Ok(FieldType::Integer));
        assert_eq!(
            field_type(&json!("float")).unwrap_err().code,
            ErrorCode::TypeError
        );
        assert_eq!(
            field_type(&json!(" ")).unwrap_err().code,
            ErrorCode::MissingValue
        );
        assert_eq!(field_type(&json!(3)).unwrap_err().code, ErrorCode::TypeError);
    }

    #[test]
    fn encodings_need_string_labels() {
        let parsed = encodings(&json!({"1": "Yes", "0": "No"})).unwrap();
        assert_eq!(parsed.get(&Scalar::Integer(0)), Some("No"));
        assert_eq!(
            encodings(&json!({"1": 1})).unwrap_err().code,
            ErrorCode::TypeError
        );
        assert_eq!(
            encodings(&json!({})).unwrap_err().code,
            ErrorCode::ConstraintError
        );
        assert_eq!(
            encodings(&json!(["Yes"])).unwrap_err().code,
            ErrorCode::TypeError
        );
    }

    #[test]
    fn lists_hold_scalars() {
        assert_eq!(
            scalar_list("missingValues", &json!([9, 2.5, "NA"])).unwrap(),
            vec![Scalar::Integer(9), Scalar::Number(2.5), Scalar::string("NA")]
        );
        assert_eq!(
            scalar_list("missingValues", &json!([])).unwrap_err().code,
            ErrorCode::ConstraintError
        );
        let violation = scalar_list("enum", &json!([1, null])).unwrap_err();
        assert_eq!(violation.code, ErrorCode::TypeError);
        assert!(violation.message.contains("enum[1]"));
    }
}
