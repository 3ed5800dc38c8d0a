//! Error reports and persisted outputs of a data dictionary conversion.

pub mod error;
pub mod errors;
pub mod output;

pub use error::ReportError;
pub use errors::ErrorReport;
pub use output::{
    ConversionResult, ERRORS_DIR, NESTED_FILE, OutputPaths, TABULAR_FILE, TABULAR_SUMMARY_FILE,
    VALIDATION_ERRORS_FILE, write_outputs,
};
