use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of schema violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorCode {
    /// A required column header is absent.
    MissingLabel,
    /// A column header is not part of the schema.
    ExtraLabel,
    /// A required value is absent or blank.
    MissingValue,
    /// A value has the wrong type or cannot be parsed.
    TypeError,
    /// A value parses but breaks a constraint (empty list, unknown option).
    ConstraintError,
    /// A value that must be unique is repeated.
    UniqueError,
    /// The document does not have the expected overall shape.
    InvalidStructure,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::MissingLabel => "missing-label",
            ErrorCode::ExtraLabel => "extra-label",
            ErrorCode::MissingValue => "missing-value",
            ErrorCode::TypeError => "type-error",
            ErrorCode::ConstraintError => "constraint-error",
            ErrorCode::UniqueError => "unique-error",
            ErrorCode::InvalidStructure => "invalid-structure",
        }
    }

    /// Short human title used in summaries.
    pub fn title(&self) -> &'static str {
        match self {
            ErrorCode::MissingLabel => "Missing Label",
            ErrorCode::ExtraLabel => "Extra Label",
            ErrorCode::MissingValue => "Missing Value",
            ErrorCode::TypeError => "Type Error",
            ErrorCode::ConstraintError => "Constraint Error",
            ErrorCode::UniqueError => "Unique Error",
            ErrorCode::InvalidStructure => "Invalid Structure",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a validation error was found.
///
/// Tabular errors use `row` (spreadsheet numbering, header is row 1) and
/// `field` (column label); nested errors use `path` (JSON pointer) and `field`
/// (the dictionary field name, when known).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorLocation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl ErrorLocation {
    pub fn row(row: usize) -> Self {
        Self {
            row: Some(row),
            ..Self::default()
        }
    }

    pub fn path(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }
}

impl fmt::Display for ErrorLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(row) = self.row {
            parts.push(format!("row {row}"));
        }
        if let Some(field) = &self.field {
            parts.push(format!("field '{field}'"));
        }
        match self.path.as_deref() {
            Some("") => parts.push("at document root".to_string()),
            Some(path) => parts.push(format!("at {path}")),
            None => {}
        }
        if parts.is_empty() {
            f.write_str("document")
        } else {
            f.write_str(&parts.join(", "))
        }
    }
}

/// A single schema violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub code: ErrorCode,
    pub location: ErrorLocation,
    pub message: String,
}

impl ValidationError {
    pub fn new(code: ErrorCode, location: ErrorLocation, message: impl Into<String>) -> Self {
        Self {
            code,
            location,
            message: message.into(),
        }
    }
}

/// Outcome of validating one view of a data dictionary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl ValidationReport {
    /// Build a report; it is valid exactly when `errors` is empty.
    pub fn from_errors(errors: Vec<ValidationError>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
            summary: None,
        }
    }

    #[must_use]
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn errors_for_row(&self, row: usize) -> impl Iterator<Item = &ValidationError> {
        self.errors
            .iter()
            .filter(move |error| error.location.row == Some(row))
    }
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::from_errors(Vec::new())
    }
}
