//! Validation of the tabular view.
//!
//! Rows are numbered as in a spreadsheet: the header is row 1, the first
//! field is row 2. Nested attributes are expected as JSON text; an empty cell
//! means the attribute is absent.

use std::collections::HashMap;

use serde_json::Value;
use tracing::debug;
use vlmd_core::TabularView;
use vlmd_core::views::tabular::{
    DESCRIPTION, ENCODINGS, ENUM, MISSING_VALUES, NAME, TABULAR_HEADERS, TYPE, row_number,
};
use vlmd_model::{ErrorCode, ErrorLocation, Field, ValidationError, ValidationReport};

use crate::rules::{self, Violation};

/// Headers every tabular view must carry.
const REQUIRED_HEADERS: [&str; 2] = [NAME, TYPE];

/// Validate a tabular view.
///
/// Returns the fields of the rows that passed every rule, plus the report.
/// Content problems never abort validation.
pub fn validate_tabular(view: &TabularView) -> (Vec<Field>, ValidationReport) {
    let mut errors = header_errors(view);
    let mut fields = Vec::new();
    let mut first_rows: HashMap<String, usize> = HashMap::new();
    let mut failed_rows = 0usize;

    let can_build = REQUIRED_HEADERS
        .iter()
        .all(|header| view.column_index(header).is_some());

    for (index, row) in view.rows.iter().enumerate() {
        let row_no = row_number(index);
        let before = errors.len();
        let field = RowCheck {
            view,
            row,
            row_no,
            errors: &mut errors,
        }
        .run();

        if let Some(field) = &field {
            if let Some(first) = first_rows.get(&field.name) {
                errors.push(ValidationError::new(
                    ErrorCode::UniqueError,
                    ErrorLocation::row(row_no).with_field(NAME),
                    format!("name '{}' already used in row {first}", field.name),
                ));
            } else {
                first_rows.insert(field.name.clone(), row_no);
            }
        }

        if errors.len() > before {
            failed_rows += 1;
        } else if can_build && let Some(field) = field {
            fields.push(field);
        }
    }

    debug!(
        rows = view.rows.len(),
        accepted = fields.len(),
        errors = errors.len(),
        "validated tabular view"
    );
    let error_count = errors.len();
    let mut report = ValidationReport::from_errors(errors);
    if !report.valid {
        report = report.with_summary(format!(
            "{error_count} error(s) in {failed_rows} row(s) of {}",
            view.rows.len()
        ));
    }
    (fields, report)
}

fn header_errors(view: &TabularView) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for header in REQUIRED_HEADERS {
        if view.column_index(header).is_none() {
            errors.push(ValidationError::new(
                ErrorCode::MissingLabel,
                ErrorLocation::row(1).with_field(header),
                format!("required column '{header}' is missing"),
            ));
        }
    }
    for header in &view.headers {
        if !TABULAR_HEADERS.contains(&header.as_str()) {
            errors.push(ValidationError::new(
                ErrorCode::ExtraLabel,
                ErrorLocation::row(1).with_field(header.as_str()),
                format!("column '{header}' is not part of the tabular schema"),
            ));
        }
    }
    let mut seen = Vec::new();
    for header in &view.headers {
        if seen.contains(&header) {
            errors.push(ValidationError::new(
                ErrorCode::UniqueError,
                ErrorLocation::row(1).with_field(header.as_str()),
                format!("column '{header}' appears more than once"),
            ));
        } else {
            seen.push(header);
        }
    }
    errors
}

struct RowCheck<'a> {
    view: &'a TabularView,
    row: &'a [String],
    row_no: usize,
    errors: &'a mut Vec<ValidationError>,
}

impl RowCheck<'_> {
    fn run(mut self) -> Option<Field> {
        let name = self.text_cell(NAME, rules::name);
        let field_type = self.text_cell(TYPE, rules::field_type);
        let description = self
            .text_cell(DESCRIPTION, rules::description)
            .flatten();
        let encodings = self.json_cell(ENCODINGS, rules::encodings);
        let missing = self.json_cell(MISSING_VALUES, |value| {
            rules::scalar_list(MISSING_VALUES, value)
        });
        let enumeration = self.json_cell(ENUM, |value| rules::scalar_list(ENUM, value));

        let mut field = Field::new(name?, field_type?)
            .with_encodings(encodings?.unwrap_or_default())
            .with_missing_values(missing?.unwrap_or_default())
            .with_enum(enumeration?.unwrap_or_default());
        field.description = description;
        Some(field)
    }

    fn record(&mut self, header: &str, violation: Violation) {
        self.errors.push(ValidationError::new(
            violation.code,
            ErrorLocation::row(self.row_no).with_field(header),
            violation.message,
        ));
    }

    /// Plain-text cell; only checked when its column exists.
    fn text_cell<T>(
        &mut self,
        header: &str,
        rule: impl Fn(&Value) -> Result<T, Violation>,
    ) -> Option<T> {
        self.view.column_index(header)?;
        let cell = self.view.cell(self.row, header);
        match rule(&Value::String(cell.to_string())) {
            Ok(value) => Some(value),
            Err(violation) => {
                self.record(header, violation);
                None
            }
        }
    }

    /// JSON cell: `Some(None)` when empty, `None` when it failed a rule.
    fn json_cell<T>(
        &mut self,
        header: &str,
        rule: impl Fn(&Value) -> Result<T, Violation>,
    ) -> Option<Option<T>> {
        let cell = self.view.cell(self.row, header).trim();
        if cell.is_empty() {
            return Some(None);
        }
        let outcome = serde_json::from_str::<Value>(cell)
            .map_err(|e| Violation {
                code: ErrorCode::TypeError,
                message: format!("{header} is not valid JSON: {e}"),
            })
            .and_then(|value| rule(&value));
        match outcome {
            Ok(value) => Some(Some(value)),
            Err(violation) => {
                self.record(header, violation);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use vlmd_model::{FieldType, Scalar};

    use super::*;

    fn view(headers: &[&str], rows: &[&[&str]]) -> TabularView {
        TabularView {
            headers: headers.iter().map(|h| (*h).to_string()).collect(),
            rows: rows
                .iter()
                .map(|row| row.iter().map(|cell| (*cell).to_string()).collect())
                .collect(),
        }
    }

    #[test]
    fn clean_view_is_valid() {
        let fields = vec![
            Field::new("smoker", FieldType::Integer)
                .with_missing_values(vec![Scalar::Integer(9)])
                .with_enum(vec![Scalar::Integer(1), Scalar::Integer(0)]),
            Field::new("site", FieldType::String).with_description("Site"),
        ];
        let (validated, report) = validate_tabular(&TabularView::from_fields(&fields).unwrap());
        assert!(report.valid, "{:?}", report.errors);
        assert!(report.summary.is_none());
        assert_eq!(validated, fields);
    }

    #[test]
    fn empty_name_gives_exactly_one_error_for_its_row() {
        let view = view(
            &TABULAR_HEADERS,
            &[
                &["age", "integer", "", "", "", ""],
                &["", "string", "Unnamed", "", "", ""],
            ],
        );
        let (fields, report) = validate_tabular(&view);
        assert!(!report.valid);
        assert_eq!(report.error_count(), 1);
        let error = &report.errors[0];
        assert_eq!(error.code, ErrorCode::MissingValue);
        assert_eq!(error.location.row, Some(3));
        assert_eq!(error.location.field.as_deref(), Some("name"));
        assert_eq!(fields.len(), 1);
    }

    #[test]
    fn headers_are_checked() {
        let view = view(&["name", "notes"], &[&["q1", ""]]);
        let (fields, report) = validate_tabular(&view);
        let codes: Vec<ErrorCode> = report.errors.iter().map(|e| e.code).collect();
        assert_eq!(codes, vec![ErrorCode::MissingLabel, ErrorCode::ExtraLabel]);
        assert!(report.errors.iter().all(|e| e.location.row == Some(1)));
        assert!(fields.is_empty());
    }

    #[test]
    fn duplicate_names_are_unique_errors() {
        let view = view(
            &["name", "type"],
            &[&["a", "string"], &["b", "string"], &["a", "integer"]],
        );
        let (fields, report) = validate_tabular(&view);
        assert_eq!(report.error_count(), 1);
        assert_eq!(report.errors[0].code, ErrorCode::UniqueError);
        assert_eq!(report.errors[0].location.row, Some(4));
        assert_eq!(fields.len(), 2);
    }

    #[test]
    fn cell_rules() {
        let view = view(
            &TABULAR_HEADERS,
            &[
                &["a", "float", "", "", "", ""],
                &["b", "integer", "", "1=Yes", "", ""],
                &["c", "integer", "", "", "[]", ""],
                &["d", "integer", "", "{\"1\": 2}", "", "[true]"],
            ],
        );
        let (fields, report) = validate_tabular(&view);
        assert!(fields.is_empty());
        let found: Vec<(Option<usize>, ErrorCode)> = report
            .errors
            .iter()
            .map(|e| (e.location.row, e.code))
            .collect();
        assert_eq!(
            found,
            vec![
                (Some(2), ErrorCode::TypeError),
                (Some(3), ErrorCode::TypeError),
                (Some(4), ErrorCode::ConstraintError),
                (Some(5), ErrorCode::TypeError),
                (Some(5), ErrorCode::TypeError),
            ]
        );
        assert_eq!(
            report.summary.as_deref(),
            Some("5 error(s) in 4 row(s) of 4")
        );
    }
}
