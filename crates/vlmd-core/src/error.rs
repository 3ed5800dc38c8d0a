//! Error types for dictionary construction and view conversion.

use thiserror::Error;

/// Fatal problems while building canonical fields from a source table.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// A missing-value range covers more than one value.
    #[error("field '{field}': missing-value range {lo}..{hi} is not supported")]
    UnsupportedMissingRange {
        field: String,
        lo: String,
        hi: String,
    },

    /// Two columns share a name.
    #[error("duplicate field name '{name}'")]
    DuplicateField { name: String },

    #[error("data frame error: {0}")]
    Frame(#[from] polars::error::PolarsError),
}

/// Problems converting between views and fields.
#[derive(Debug, Error)]
pub enum ViewError {
    /// A cell could not be parsed into its attribute.
    #[error("row {row}, column '{column}': {message}")]
    InvalidCell {
        row: usize,
        column: String,
        message: String,
    },

    /// The nested document does not have the expected shape.
    #[error("invalid nested view: {message}")]
    InvalidDocument { message: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
