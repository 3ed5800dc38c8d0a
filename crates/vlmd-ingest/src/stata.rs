//! Stata data file adapter.
//!
//! Integer storage types become integer columns and `%td` / `%tc` formats
//! become date and datetime columns. Every missing code (`.` and `.a` to
//! `.z`) is null in the frame. Extended codes that occur in the data or key
//! a value label are declared as missing values in their `.a` text form.

use std::collections::BTreeSet;
use std::path::Path;

use polars::prelude::*;
use tracing::{debug, info};
use vlmd_core::values::date_to_days;
use vlmd_core::{MetadataBundle, RawValue, SourceTable, VariableMetadata, normalize_dictionary};
use vlmd_dta::datetime::{days_to_date, millis_to_datetime};
use vlmd_dta::{DtaFile, DtaValue, DtaVariable, MissingCode, TemporalKind, read_dta};
use vlmd_model::{DataDictionary, DictionaryProps};

use crate::adapter::SourceAdapter;
use crate::error::IngestError;
use crate::kind::InputKind;

#[derive(Debug, Clone, Copy, Default)]
pub struct DtaAdapter;

impl SourceAdapter for DtaAdapter {
    fn kind(&self) -> InputKind {
        InputKind::StataFile
    }

    fn extract(
        &self,
        path: &Path,
        props: &DictionaryProps,
        default_title: &str,
    ) -> Result<DataDictionary, IngestError> {
        let file = read_dta(path)?;
        info!(
            path = %path.display(),
            release = file.header.release.number(),
            variable_count = file.variables.len(),
            row_count = file.num_rows(),
            label_sets = file.label_sets.len(),
            dataset_label = file.header.label.as_deref().unwrap_or(""),
            "read dta file"
        );
        let table = stata_source_table(&file)?;
        Ok(normalize_dictionary(&table, props, default_title)?)
    }
}

/// Build the frame and metadata bundle of a parsed Stata data file.
pub fn stata_source_table(file: &DtaFile) -> Result<SourceTable, IngestError> {
    let mut columns = Vec::with_capacity(file.variables.len());
    let mut metadata = MetadataBundle::new();

    for (index, variable) in file.variables.iter().enumerate() {
        columns.push(build_column(variable, file.column(index))?);
        let variable_metadata = variable_metadata(file, index);
        debug!(
            variable = %variable.name,
            storage = ?variable.storage,
            value_labels = variable_metadata.value_labels.len(),
            missing_codes = variable_metadata.missing_values.len(),
            "mapped variable"
        );
        metadata.insert(variable.name.clone(), variable_metadata);
    }
    Ok(SourceTable::new(DataFrame::new(columns)?, metadata))
}

fn build_column<'a>(
    variable: &DtaVariable,
    values: impl Iterator<Item = &'a DtaValue>,
) -> Result<Column, IngestError> {
    let name: PlSmallStr = variable.name.as_str().into();
    if !variable.storage.is_numeric() {
        let values: Vec<Option<String>> = values
            .map(|value| {
                value
                    .as_str()
                    .filter(|text| !text.is_empty())
                    .map(str::to_string)
            })
            .collect();
        return Ok(Series::new(name, values).into());
    }

    let numbers = values.map(DtaValue::as_f64);
    let series = match variable.temporal_kind() {
        Some(TemporalKind::Date) => {
            let days: Vec<Option<i32>> = numbers
                .map(|days| days.and_then(days_to_date).map(date_to_days))
                .collect();
            Series::new(name, days).cast(&DataType::Date)?
        }
        Some(TemporalKind::Datetime) => {
            let millis: Vec<Option<i64>> = numbers
                .map(|millis| {
                    millis
                        .and_then(millis_to_datetime)
                        .map(|datetime| datetime.and_utc().timestamp_millis())
                })
                .collect();
            Series::new(name, millis).cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?
        }
        None if variable.storage.is_integer() => {
            let integers: Vec<Option<i64>> = numbers.map(|n| n.map(|n| n as i64)).collect();
            Series::new(name, integers)
        }
        None => Series::new(name, numbers.collect::<Vec<Option<f64>>>()),
    };
    Ok(series.into())
}

fn variable_metadata(file: &DtaFile, index: usize) -> VariableMetadata {
    let variable = &file.variables[index];
    let mut metadata = VariableMetadata::new();
    metadata.label = variable.label.clone();

    let mut codes: BTreeSet<MissingCode> = file
        .column(index)
        .filter_map(DtaValue::missing_code)
        .collect();
    if let Some(set) = file.value_labels(variable) {
        for (value, label) in &set.entries {
            if let Some(code) = value.missing_code() {
                codes.insert(code);
            }
            if let Some(raw) = label_value(variable, value) {
                metadata.value_labels.push((raw, label.clone()));
            }
        }
    }
    metadata.missing_values = codes
        .into_iter()
        .filter(|code| *code != MissingCode::System)
        .map(|code| RawValue::Text(code.to_string()))
        .collect();
    metadata
}

/// Label key in the variable's own terms: a calendar value for date
/// formats, the `.a` text form for missing codes.
fn label_value(variable: &DtaVariable, value: &DtaValue) -> Option<RawValue> {
    match value {
        DtaValue::Number(number) => {
            let calendar = match variable.temporal_kind() {
                Some(TemporalKind::Date) => days_to_date(*number).map(RawValue::Date),
                Some(TemporalKind::Datetime) => millis_to_datetime(*number).map(RawValue::Datetime),
                None => None,
            };
            Some(calendar.unwrap_or(RawValue::Number(*number)))
        }
        DtaValue::Missing(code) => Some(RawValue::Text(code.to_string())),
        DtaValue::Text(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use vlmd_dta::{LabelSet, StorageType};

    use super::*;

    fn smoking_file() -> DtaFile {
        let mut file = DtaFile::with_variables(vec![
            DtaVariable::new("smoking", StorageType::Byte)
                .with_label("Smoking status")
                .with_value_labels("smoking"),
            DtaVariable::new("income", StorageType::Double),
        ])
        .with_label_set(
            LabelSet::new("smoking")
                .with_label(DtaValue::number(1.0), "Current")
                .with_label(DtaValue::number(2.0), "Never")
                .with_label(DtaValue::extended_missing('r'), "Refused"),
        );
        file.add_row(vec![DtaValue::number(1.0), DtaValue::number(1.5)]);
        file.add_row(vec![DtaValue::extended_missing('d'), DtaValue::missing()]);
        file.add_row(vec![DtaValue::number(2.0), DtaValue::extended_missing('a')]);
        file
    }

    #[test]
    fn missing_codes_are_null_and_integer_storage_stays_integer() {
        let table = stata_source_table(&smoking_file()).unwrap();
        let smoking = table.frame.column("smoking").unwrap();
        assert_eq!(smoking.dtype(), &DataType::Int64);
        assert_eq!(smoking.null_count(), 1);
        let income = table.frame.column("income").unwrap();
        assert_eq!(income.dtype(), &DataType::Float64);
        assert_eq!(income.null_count(), 2);
    }

    #[test]
    fn extended_codes_from_data_and_labels_are_declared_in_order() {
        let table = stata_source_table(&smoking_file()).unwrap();
        let smoking = table.metadata.get("smoking").unwrap();
        assert_eq!(
            smoking.missing_values,
            vec![RawValue::Text(".d".to_string()), RawValue::Text(".r".to_string())]
        );
        assert_eq!(
            smoking.value_labels[2],
            (RawValue::Text(".r".to_string()), "Refused".to_string())
        );
        let income = table.metadata.get("income").unwrap();
        assert_eq!(income.missing_values, vec![RawValue::Text(".a".to_string())]);
    }

    #[test]
    fn date_formats_become_date_columns() {
        let mut file = DtaFile::with_variables(vec![
            DtaVariable::new("visit", StorageType::Long).with_format("%td"),
            DtaVariable::new("seen", StorageType::Double).with_format("%tc"),
        ]);
        file.add_row(vec![DtaValue::number(14_610.0), DtaValue::number(0.0)]);
        let table = stata_source_table(&file).unwrap();
        assert_eq!(table.frame.column("visit").unwrap().dtype(), &DataType::Date);
        assert_eq!(
            table.frame.column("seen").unwrap().dtype(),
            &DataType::Datetime(TimeUnit::Milliseconds, None)
        );
    }
}
