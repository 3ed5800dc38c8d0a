use std::path::PathBuf;

use thiserror::Error;
use vlmd_core::{ResolveError, ViewError};
use vlmd_dta::DtaError;
use vlmd_sav::SavError;

/// Errors raised while turning an input artifact into a data dictionary.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The input type is not registered.
    #[error("unsupported input type '{kind}' (registered types: {registered})")]
    UnsupportedArtifactKind { kind: String, registered: String },

    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// The file was read but does not describe a data dictionary.
    #[error("invalid template {path}: {message}")]
    InvalidTemplate { path: PathBuf, message: String },

    #[error("failed to read CSV {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to parse JSON {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Sav(#[from] SavError),

    #[error(transparent)]
    Dta(#[from] DtaError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    View(#[from] ViewError),

    #[error("data frame error: {0}")]
    Frame(#[from] polars::error::PolarsError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl IngestError {
    pub fn invalid_template(path: &std::path::Path, message: impl Into<String>) -> Self {
        Self::InvalidTemplate {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }
}
