//! Registered input kinds and dispatch to their adapters.

use std::fmt;
use std::path::Path;

use vlmd_model::{DataDictionary, DictionaryProps};

use crate::adapter::SourceAdapter;
use crate::csv_template::CsvTemplateAdapter;
use crate::error::IngestError;
use crate::json_template::JsonTemplateAdapter;
use crate::redcap::RedcapAdapter;
use crate::stata::DtaAdapter;
use crate::statistical::SavAdapter;

/// Kind of input artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputKind {
    /// Tabular data dictionary template (`csv`).
    CsvTemplate,
    /// JSON data dictionary template (`json`).
    JsonTemplate,
    /// SPSS system file (`sav`).
    StatisticalFile,
    /// Stata data file (`dta`).
    StataFile,
    /// REDCap data dictionary export (`redcap.csv`).
    RedcapCsv,
}

impl InputKind {
    pub const ALL: [InputKind; 5] = [
        InputKind::CsvTemplate,
        InputKind::JsonTemplate,
        InputKind::StatisticalFile,
        InputKind::StataFile,
        InputKind::RedcapCsv,
    ];

    /// Token used on the command line and as the file suffix.
    pub fn token(self) -> &'static str {
        match self {
            InputKind::CsvTemplate => "csv",
            InputKind::JsonTemplate => "json",
            InputKind::StatisticalFile => "sav",
            InputKind::StataFile => "dta",
            InputKind::RedcapCsv => "redcap.csv",
        }
    }

    /// One-line help text.
    pub fn description(self) -> &'static str {
        match self {
            InputKind::CsvTemplate => {
                "Tabular data dictionary template with name, type, description, encodings, missingValues and constraints.enum columns"
            }
            InputKind::JsonTemplate => {
                "JSON data dictionary template: an object with title, description and data_dictionary, or a bare array of fields"
            }
            InputKind::StatisticalFile => {
                "SPSS system file; types are inferred from the data, labels and missing values from the metadata"
            }
            InputKind::StataFile => {
                "Stata 13+ data file; value labels become encodings and .a to .z codes become missing values"
            }
            InputKind::RedcapCsv => {
                "REDCap data dictionary export; choice fields become encodings and checkboxes expand into one field per option"
            }
        }
    }

    fn registered_tokens() -> String {
        Self::ALL
            .iter()
            .map(|kind| kind.token())
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn unsupported(kind: &str) -> IngestError {
        IngestError::UnsupportedArtifactKind {
            kind: kind.to_string(),
            registered: Self::registered_tokens(),
        }
    }

    /// Parse a kind token, case-insensitively and ignoring a leading dot.
    pub fn from_token(token: &str) -> Result<Self, IngestError> {
        let normalized = token.trim().trim_start_matches('.').to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.token() == normalized)
            .ok_or_else(|| Self::unsupported(token.trim()))
    }

    /// Infer the kind from a file name: all suffixes joined first
    /// (`data.redcap.csv` is `redcap.csv`), then the last suffix alone.
    pub fn infer_from_path(path: &Path) -> Result<Self, IngestError> {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        let Some((_, suffixes)) = file_name.split_once('.') else {
            return Err(Self::unsupported(""));
        };
        if let Ok(kind) = Self::from_token(suffixes) {
            return Ok(kind);
        }
        let last = suffixes.rsplit('.').next().unwrap_or(suffixes);
        Self::from_token(last).map_err(|_| Self::unsupported(suffixes))
    }

    /// Run this kind's adapter.
    pub fn extract(self, path: &Path, props: &DictionaryProps) -> Result<DataDictionary, IngestError> {
        let default_title = default_title(path);
        match self {
            InputKind::CsvTemplate => CsvTemplateAdapter.extract(path, props, &default_title),
            InputKind::JsonTemplate => JsonTemplateAdapter.extract(path, props, &default_title),
            InputKind::StatisticalFile => SavAdapter.extract(path, props, &default_title),
            InputKind::StataFile => DtaAdapter.extract(path, props, &default_title),
            InputKind::RedcapCsv => RedcapAdapter.extract(path, props, &default_title),
        }
    }
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// File stem used as the title when nothing else supplies one.
pub fn default_title(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| "data-dictionary".to_string())
}
