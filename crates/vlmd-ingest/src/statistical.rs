//! SPSS system file adapter.
//!
//! Case data becomes a polars frame: date-formatted numerics become date or
//! datetime columns, system-missing and empty strings become nulls, and
//! user-missing values keep their stored values. Variable labels, value
//! labels and missing-value declarations go into the metadata bundle.

use std::path::Path;

use polars::prelude::*;
use tracing::{debug, info};
use vlmd_core::values::date_to_days;
use vlmd_core::{MetadataBundle, RawValue, SourceTable, VariableMetadata, normalize_dictionary};
use vlmd_model::{DataDictionary, DictionaryProps};
use vlmd_sav::datetime::{seconds_to_date, seconds_to_datetime};
use vlmd_sav::{SavFile, SavValue, SavVariable, TemporalKind, read_sav};

use crate::adapter::SourceAdapter;
use crate::error::IngestError;
use crate::kind::InputKind;

#[derive(Debug, Clone, Copy, Default)]
pub struct SavAdapter;

impl SourceAdapter for SavAdapter {
    fn kind(&self) -> InputKind {
        InputKind::StatisticalFile
    }

    fn extract(
        &self,
        path: &Path,
        props: &DictionaryProps,
        default_title: &str,
    ) -> Result<DataDictionary, IngestError> {
        let file = read_sav(path)?;
        info!(
            path = %path.display(),
            variable_count = file.variables.len(),
            row_count = file.num_rows(),
            compression = ?file.header.compression,
            encoding = file.encoding.as_deref().unwrap_or("unspecified"),
            file_label = file.header.file_label.as_deref().unwrap_or(""),
            "read sav file"
        );
        let table = source_table(&file)?;
        Ok(normalize_dictionary(&table, props, default_title)?)
    }
}

/// Build the frame and metadata bundle of a parsed system file.
pub fn source_table(file: &SavFile) -> Result<SourceTable, IngestError> {
    let mut columns = Vec::with_capacity(file.variables.len());
    let mut metadata = MetadataBundle::new();

    for (index, variable) in file.variables.iter().enumerate() {
        columns.push(build_column(variable, file.column(index))?);
        metadata.insert(variable.name.clone(), variable_metadata(variable));
        debug!(
            variable = %variable.name,
            var_type = ?variable.var_type,
            value_labels = variable.value_labels.len(),
            missing_discrete = variable.missing.discrete.len(),
            missing_range = variable.missing.range.is_some(),
            "mapped variable"
        );
    }
    Ok(SourceTable::new(DataFrame::new(columns)?, metadata))
}

fn build_column<'a>(
    variable: &SavVariable,
    values: impl Iterator<Item = &'a SavValue>,
) -> Result<Column, IngestError> {
    let name: PlSmallStr = variable.name.as_str().into();
    let series = if !variable.is_numeric() {
        let values: Vec<Option<String>> = values
            .map(|value| {
                value
                    .as_str()
                    .filter(|text| !text.is_empty())
                    .map(str::to_string)
            })
            .collect();
        Series::new(name, values)
    } else {
        let numbers = values.map(SavValue::as_f64);
        match variable.print_format.temporal_kind() {
            Some(TemporalKind::Date) => {
                let days: Vec<Option<i32>> = numbers
                    .map(|seconds| seconds.and_then(seconds_to_date).map(date_to_days))
                    .collect();
                Series::new(name, days).cast(&DataType::Date)?
            }
            Some(TemporalKind::Datetime) => {
                let millis: Vec<Option<i64>> = numbers
                    .map(|seconds| {
                        seconds
                            .and_then(seconds_to_datetime)
                            .map(|datetime| datetime.and_utc().timestamp_millis())
                    })
                    .collect();
                Series::new(name, millis)
                    .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?
            }
            None => Series::new(name, numbers.collect::<Vec<Option<f64>>>()),
        }
    };
    Ok(series.into())
}

fn variable_metadata(variable: &SavVariable) -> VariableMetadata {
    let mut metadata = VariableMetadata::new();
    metadata.label = variable.label.clone();
    metadata.value_labels = variable
        .value_labels
        .iter()
        .filter_map(|(value, label)| raw_value(variable, value).map(|raw| (raw, label.clone())))
        .collect();
    metadata.missing_values = variable
        .missing
        .discrete
        .iter()
        .filter_map(|value| raw_value(variable, value))
        .collect();
    if let Some((lo, hi)) = variable.missing.range {
        // LO and HI are stored as extreme floats that have no calendar form.
        let endpoint = |value: f64| temporal_value(variable, value);
        metadata.missing_ranges.push((endpoint(lo), endpoint(hi)));
    }
    metadata
}

/// Declared value in the variable's own terms. Only system-missing has no
/// value.
fn raw_value(variable: &SavVariable, value: &SavValue) -> Option<RawValue> {
    match value {
        SavValue::String(text) => Some(RawValue::Text(text.clone())),
        SavValue::Numeric(number) => number.map(|number| temporal_value(variable, number)),
    }
}

/// Calendar value for date-formatted numerics; stays a number when it has no
/// calendar form.
fn temporal_value(variable: &SavVariable, number: f64) -> RawValue {
    let calendar = match variable.print_format.temporal_kind() {
        Some(TemporalKind::Date) => seconds_to_date(number).map(RawValue::Date),
        Some(TemporalKind::Datetime) => seconds_to_datetime(number).map(RawValue::Datetime),
        None => None,
    };
    calendar.unwrap_or(RawValue::Number(number))
}
