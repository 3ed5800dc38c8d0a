//! Validation of the nested (JSON document) view.
//!
//! Every error carries a JSON pointer to the offending value, e.g.
//! `/data_dictionary/3/encodings`.

use std::collections::{HashMap, VecDeque};

use serde_json::{Map, Value};
use tracing::debug;
use vlmd_core::views::FIELDS_KEY;
use vlmd_model::{ErrorCode, ErrorLocation, Field, Scalar, ValidationError, ValidationReport};

use crate::rules::{self, Violation};

const FIELD_KEYS: [&str; 6] = [
    "name",
    "type",
    "description",
    "encodings",
    "missingValues",
    "constraints",
];

/// Validate a nested view.
///
/// Returns the fields that passed every rule, plus the report.
pub fn validate_nested(document: &Value) -> (Vec<Field>, ValidationReport) {
    let mut errors = ErrorQueue::default();
    let fields = validate_document(document, &mut errors);
    let error_count = errors.len();
    debug!(
        accepted = fields.len(),
        errors = error_count,
        "validated nested view"
    );
    let mut report = errors.into_report();
    if !report.valid {
        report = report.with_summary(format!("{error_count} error(s)"));
    }
    (fields, report)
}

/// Errors in discovery order, handed over to the report once.
#[derive(Default)]
struct ErrorQueue {
    queue: VecDeque<ValidationError>,
}

impl ErrorQueue {
    fn push(&mut self, code: ErrorCode, location: ErrorLocation, message: impl Into<String>) {
        self.queue
            .push_back(ValidationError::new(code, location, message));
    }

    fn violation(&mut self, pointer: &str, field: Option<&str>, violation: Violation) {
        let mut location = ErrorLocation::path(pointer);
        if let Some(field) = field {
            location = location.with_field(field);
        }
        self.push(violation.code, location, violation.message);
    }

    fn len(&self) -> usize {
        self.queue.len()
    }

    fn into_report(self) -> ValidationReport {
        ValidationReport::from_errors(Vec::from(self.queue))
    }
}

fn validate_document(document: &Value, errors: &mut ErrorQueue) -> Vec<Field> {
    let Value::Object(root) = document else {
        errors.push(
            ErrorCode::InvalidStructure,
            ErrorLocation::path(""),
            "data dictionary must be a JSON object",
        );
        return Vec::new();
    };

    match root.get("title") {
        None => errors.push(
            ErrorCode::MissingValue,
            ErrorLocation::path("/title"),
            "title is required",
        ),
        Some(Value::String(_)) => {}
        Some(_) => errors.push(
            ErrorCode::TypeError,
            ErrorLocation::path("/title"),
            "title must be a string",
        ),
    }
    if let Some(description) = root.get("description")
        && let Err(violation) = rules::description(description)
    {
        errors.violation("/description", None, violation);
    }

    let pointer = format!("/{FIELDS_KEY}");
    let items = match root.get(FIELDS_KEY) {
        Some(Value::Array(items)) => items,
        Some(_) => {
            errors.push(
                ErrorCode::TypeError,
                ErrorLocation::path(pointer),
                format!("{FIELDS_KEY} must be an array"),
            );
            return Vec::new();
        }
        None => {
            errors.push(
                ErrorCode::MissingValue,
                ErrorLocation::path(pointer),
                format!("{FIELDS_KEY} is required"),
            );
            return Vec::new();
        }
    };

    let mut fields = Vec::with_capacity(items.len());
    let mut first_index: HashMap<String, usize> = HashMap::new();
    for (index, item) in items.iter().enumerate() {
        let pointer = format!("/{FIELDS_KEY}/{index}");
        let before = errors.len();
        let field = validate_field(item, &pointer, errors);

        if let Some(field) = &field {
            if let Some(first) = first_index.get(&field.name) {
                errors.push(
                    ErrorCode::UniqueError,
                    ErrorLocation::path(format!("{pointer}/name")).with_field(field.name.as_str()),
                    format!(
                        "name '{}' already used by {FIELDS_KEY}/{first}",
                        field.name
                    ),
                );
            } else {
                first_index.insert(field.name.clone(), index);
            }
        }
        if errors.len() == before
            && let Some(field) = field
        {
            fields.push(field);
        }
    }
    fields
}

fn validate_field(item: &Value, pointer: &str, errors: &mut ErrorQueue) -> Option<Field> {
    let Value::Object(object) = item else {
        errors.push(
            ErrorCode::TypeError,
            ErrorLocation::path(pointer),
            "field must be an object",
        );
        return None;
    };

    let name = required(object, "name", pointer, None, errors, rules::name);
    let label = name.as_deref();

    for key in object.keys() {
        if !FIELD_KEYS.contains(&key.as_str()) {
            let mut location = ErrorLocation::path(format!("{pointer}/{key}"));
            if let Some(label) = label {
                location = location.with_field(label);
            }
            errors.push(
                ErrorCode::ExtraLabel,
                location,
                format!("property '{key}' is not part of the field schema"),
            );
        }
    }

    let field_type = required(object, "type", pointer, label, errors, rules::field_type);
    let description = optional(object, "description", pointer, label, errors, rules::description)
        .map(Option::flatten);
    let encodings = optional(object, "encodings", pointer, label, errors, rules::encodings);
    let missing = optional(object, "missingValues", pointer, label, errors, |value| {
        rules::scalar_list("missingValues", value)
    });
    let enumeration = constraints(object, pointer, label, errors);

    let mut field = Field::new(name?, field_type?)
        .with_encodings(encodings?.unwrap_or_default())
        .with_missing_values(missing?.unwrap_or_default())
        .with_enum(enumeration?.unwrap_or_default());
    field.description = description?;
    Some(field)
}

fn required<T>(
    object: &Map<String, Value>,
    key: &str,
    pointer: &str,
    field: Option<&str>,
    errors: &mut ErrorQueue,
    rule: impl Fn(&Value) -> Result<T, Violation>,
) -> Option<T> {
    let path = format!("{pointer}/{key}");
    let Some(value) = object.get(key) else {
        errors.violation(
            &path,
            field,
            Violation {
                code: ErrorCode::MissingValue,
                message: format!("{key} is required"),
            },
        );
        return None;
    };
    rule(value)
        .map_err(|violation| errors.violation(&path, field, violation))
        .ok()
}

/// `Some(None)` when absent, `None` when present but invalid.
fn optional<T>(
    object: &Map<String, Value>,
    key: &str,
    pointer: &str,
    field: Option<&str>,
    errors: &mut ErrorQueue,
    rule: impl Fn(&Value) -> Result<T, Violation>,
) -> Option<Option<T>> {
    let Some(value) = object.get(key) else {
        return Some(None);
    };
    match rule(value) {
        Ok(value) => Some(Some(value)),
        Err(violation) => {
            errors.violation(&format!("{pointer}/{key}"), field, violation);
            None
        }
    }
}

fn constraints(
    object: &Map<String, Value>,
    pointer: &str,
    field: Option<&str>,
    errors: &mut ErrorQueue,
) -> Option<Option<Vec<Scalar>>> {
    let Some(value) = object.get("constraints") else {
        return Some(None);
    };
    let pointer = format!("{pointer}/constraints");
    let Value::Object(constraints) = value else {
        errors.violation(
            &pointer,
            field,
            Violation {
                code: ErrorCode::TypeError,
                message: "constraints must be an object".to_string(),
            },
        );
        return None;
    };
    let mut valid = true;
    for key in constraints.keys().filter(|key| key.as_str() != "enum") {
        valid = false;
        errors.violation(
            &format!("{pointer}/{key}"),
            field,
            Violation {
                code: ErrorCode::ExtraLabel,
                message: format!("constraint '{key}' is not supported"),
            },
        );
    }
    let enumeration = optional(constraints, "enum", &pointer, field, errors, |value| {
        rules::scalar_list("enum", value)
    });
    if valid { enumeration } else { None }
}
