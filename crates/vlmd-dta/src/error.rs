//! Error types for Stata data file operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when reading or writing `.dta` files.
#[derive(Debug, Error)]
pub enum DtaError {
    /// File not found.
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Invalid data file layout.
    #[error("invalid Stata data file: {message}")]
    InvalidFormat { message: String },

    /// Format release the reader does not implement.
    #[error("unsupported Stata file release {release} (releases 117, 118 and 119 are supported)")]
    UnsupportedRelease { release: String },

    /// Input ended before a complete section or value.
    #[error("file truncated at offset {offset}")]
    Truncated { offset: usize },

    /// A value that cannot be stored in its variable.
    #[error("invalid value for variable {variable}: {message}")]
    InvalidValue { variable: String, message: String },

    /// Row length mismatch.
    #[error("row length mismatch: expected {expected}, got {actual}")]
    RowLengthMismatch { expected: usize, actual: usize },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Stata data file operations.
pub type Result<T> = std::result::Result<T, DtaError>;

impl DtaError {
    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            message: message.into(),
        }
    }

    pub fn invalid_value(variable: &str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            variable: variable.to_string(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = DtaError::UnsupportedRelease {
            release: "114".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "unsupported Stata file release 114 (releases 117, 118 and 119 are supported)"
        );
        let err = DtaError::invalid_value("age", "300 does not fit a byte");
        assert_eq!(
            err.to_string(),
            "invalid value for variable age: 300 does not fit a byte"
        );
    }
}
