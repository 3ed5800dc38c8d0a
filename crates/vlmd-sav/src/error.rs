//! Error types for SPSS system file operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when reading or writing `.sav` files.
#[derive(Debug, Error)]
pub enum SavError {
    /// File not found.
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Invalid system file format.
    #[error("invalid SPSS system file: {message}")]
    InvalidFormat { message: String },

    /// Compression scheme the reader does not implement.
    #[error("unsupported compression code {code} (only uncompressed and bytecode files are supported)")]
    UnsupportedCompression { code: i32 },

    /// Input ended before a complete record or value.
    #[error("file truncated at offset {offset}")]
    Truncated { offset: usize },

    /// Dictionary record type not defined by the format.
    #[error("unknown record type {record_type} at offset {offset}")]
    UnknownRecord { record_type: i32, offset: usize },

    /// Invalid variable record or variable definition.
    #[error("invalid variable at index {index}: {message}")]
    InvalidVariable { index: usize, message: String },

    /// Invalid value label record.
    #[error("invalid value labels: {message}")]
    InvalidValueLabels { message: String },

    /// Row length mismatch.
    #[error("row length mismatch: expected {expected}, got {actual}")]
    RowLengthMismatch { expected: usize, actual: usize },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for SPSS system file operations.
pub type Result<T> = std::result::Result<T, SavError>;

impl SavError {
    /// Create an InvalidFormat error.
    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            message: message.into(),
        }
    }

    /// Create an InvalidVariable error.
    pub fn invalid_variable(index: usize, message: impl Into<String>) -> Self {
        Self::InvalidVariable {
            index,
            message: message.into(),
        }
    }

    /// Create an InvalidValueLabels error.
    pub fn invalid_value_labels(message: impl Into<String>) -> Self {
        Self::InvalidValueLabels {
            message: message.into(),
        }
    }
}
