//! Conversion pipeline: extract, render views, validate, report.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, info_span, warn};
use vlmd_core::{ViewError, build_views};
use vlmd_ingest::{IngestError, InputKind};
use vlmd_model::DictionaryProps;
use vlmd_validate::{validate_nested, validate_tabular};

pub use vlmd_report::{ConversionResult, ErrorReport, OutputPaths};
use vlmd_report::{ReportError, write_outputs};

/// Options of one conversion. Build a fresh value per call.
#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    /// Title and description overriding what the input declares.
    pub props: DictionaryProps,
    /// Input kind; inferred from the file name when unset.
    pub input_kind: Option<InputKind>,
    /// Existing directory to write outputs to.
    pub output_dir: Option<PathBuf>,
}

impl ConvertOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_props(mut self, props: DictionaryProps) -> Self {
        self.props = props;
        self
    }

    #[must_use]
    pub fn with_input_kind(mut self, kind: InputKind) -> Self {
        self.input_kind = Some(kind);
        self
    }

    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }
}

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("output directory {path} does not exist or is not a directory")]
    OutputDirectoryInvalid { path: PathBuf },

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error("failed to render views: {0}")]
    View(#[from] ViewError),

    #[error(transparent)]
    Report(#[from] ReportError),
}

/// Convert one input file.
///
/// Invalid validation reports are part of the result, not errors. Outputs are
/// only written when `options.output_dir` is set; that directory is checked
/// before anything is read.
pub fn convert(path: &Path, options: &ConvertOptions) -> Result<ConversionResult, ConvertError> {
    let span = info_span!("convert", path = %path.display());
    let _guard = span.enter();

    if let Some(dir) = &options.output_dir
        && !dir.is_dir()
    {
        return Err(ConvertError::OutputDirectoryInvalid { path: dir.clone() });
    }

    let kind = match options.input_kind {
        Some(kind) => kind,
        None => InputKind::infer_from_path(path)?,
    };
    info!(input_type = %kind, "extracting data dictionary");
    let dictionary = kind.extract(path, &options.props)?;

    let views = build_views(&dictionary)?;
    let (tabular_fields, tabular_report) = validate_tabular(&views.tabular);
    let (nested_fields, nested_report) = validate_nested(&views.nested);
    let errors = ErrorReport::new(tabular_report, nested_report);
    if errors.is_valid() {
        info!(fields = dictionary.fields().len(), "both views are valid");
    } else {
        warn!(
            tabular_valid = errors.tabular.valid,
            nested_valid = errors.nested.valid,
            error_count = errors.error_count(),
            "data dictionary failed validation"
        );
    }

    let result = ConversionResult {
        dictionary,
        tabular: views.tabular,
        nested: views.nested,
        tabular_fields,
        nested_fields,
        errors,
    };
    if let Some(dir) = &options.output_dir {
        write_outputs(dir, &result)?;
    }
    Ok(result)
}
