//! Files written for a finished conversion.
//!
//! ```text
//! <dir>/nested-data-dictionary.json
//! <dir>/tabular-data-dictionary.csv
//! <dir>/errors/validation-errors.json
//! <dir>/errors/tabular-errors-summary.txt
//! ```

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::info;
use vlmd_core::TabularView;
use vlmd_model::{DataDictionary, Field};

use crate::error::ReportError;
use crate::errors::ErrorReport;

pub const NESTED_FILE: &str = "nested-data-dictionary.json";
pub const TABULAR_FILE: &str = "tabular-data-dictionary.csv";
pub const ERRORS_DIR: &str = "errors";
pub const VALIDATION_ERRORS_FILE: &str = "validation-errors.json";
pub const TABULAR_SUMMARY_FILE: &str = "tabular-errors-summary.txt";

/// Everything one conversion produces, kept in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionResult {
    pub dictionary: DataDictionary,
    pub tabular: TabularView,
    pub nested: Value,
    /// Fields accepted by the tabular validator.
    pub tabular_fields: Vec<Field>,
    /// Fields accepted by the nested validator.
    pub nested_fields: Vec<Field>,
    pub errors: ErrorReport,
}

/// Paths of the files written by [`write_outputs`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub nested: PathBuf,
    pub tabular: PathBuf,
    pub validation_errors: PathBuf,
    pub tabular_summary: PathBuf,
}

impl OutputPaths {
    pub fn in_dir(dir: &Path) -> Self {
        let errors = dir.join(ERRORS_DIR);
        Self {
            nested: dir.join(NESTED_FILE),
            tabular: dir.join(TABULAR_FILE),
            validation_errors: errors.join(VALIDATION_ERRORS_FILE),
            tabular_summary: errors.join(TABULAR_SUMMARY_FILE),
        }
    }
}

/// Write both views and both error reports under `dir`.
///
/// `dir` must exist; the `errors` subdirectory is created as needed.
pub fn write_outputs(dir: &Path, result: &ConversionResult) -> Result<OutputPaths, ReportError> {
    let paths = OutputPaths::in_dir(dir);
    let errors_dir = dir.join(ERRORS_DIR);
    fs::create_dir_all(&errors_dir).map_err(|e| ReportError::write(&errors_dir, e))?;

    write_json(&paths.nested, &result.nested)?;
    write_with(&paths.tabular, |file| Ok(result.tabular.write_csv(file)?))?;
    write_json(&paths.validation_errors, &result.errors.to_json()?)?;
    let summary = result.errors.tabular_summary();
    write_with(&paths.tabular_summary, |file| {
        file.write_all(summary.as_bytes())
            .map_err(|e| ReportError::write(&paths.tabular_summary, e))
    })?;

    info!(
        dir = %dir.display(),
        fields = result.dictionary.fields().len(),
        valid = result.errors.is_valid(),
        "wrote conversion outputs"
    );
    Ok(paths)
}

fn write_json(path: &Path, value: &Value) -> Result<(), ReportError> {
    write_with(path, |file| {
        serde_json::to_writer_pretty(&mut *file, value)?;
        file.write_all(b"\n").map_err(|e| ReportError::write(path, e))
    })
}

fn write_with(
    path: &Path,
    write: impl FnOnce(&mut BufWriter<File>) -> Result<(), ReportError>,
) -> Result<(), ReportError> {
    let file = File::create(path).map_err(|e| ReportError::write(path, e))?;
    let mut writer = BufWriter::new(file);
    write(&mut writer)?;
    writer.flush().map_err(|e| ReportError::write(path, e))
}
