//! End-to-end conversions through `convert`.

use std::fs;
use std::path::Path;

use vlmd_cli::{ConvertError, ConvertOptions, convert};
use vlmd_dta::{DtaFile, DtaValue, DtaVariable, LabelSet, StorageType, write_dta};
use vlmd_ingest::InputKind;
use vlmd_model::{DictionaryProps, ErrorCode, FieldType, Scalar};
use vlmd_report::OutputPaths;
use vlmd_sav::{SavFile, SavValue, SavVariable, write_sav};

fn labelled_survey(path: &Path) {
    let mut file = SavFile::with_variables(vec![
        SavVariable::numeric("complete")
            .with_label("Every value labelled")
            .with_value_label(SavValue::numeric(1.0), "One")
            .with_value_label(SavValue::numeric(2.0), "Two"),
        SavVariable::numeric("partial")
            .with_label("Some values labelled")
            .with_value_label(SavValue::numeric(1.0), "One"),
        SavVariable::numeric("unlabelled"),
    ]);
    for (complete, partial, unlabelled) in [(1.0, 1.0, 10.0), (2.0, 2.0, 20.5), (1.0, 1.0, 30.0)] {
        file.add_row(vec![
            SavValue::numeric(complete),
            SavValue::numeric(partial),
            SavValue::numeric(unlabelled),
        ]);
    }
    write_sav(path, &file).unwrap();
}

#[test]
fn statistical_file_gets_enum_only_where_every_value_is_labelled() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("labels.sav");
    labelled_survey(&path);

    let result = convert(&path, &ConvertOptions::new()).unwrap();
    assert!(result.errors.is_valid());
    assert_eq!(result.dictionary.title, "labels");

    let complete = result.dictionary.field("complete").unwrap();
    assert_eq!(complete.field_type, FieldType::Integer);
    assert_eq!(
        complete.enum_values(),
        Some(&[Scalar::Integer(1), Scalar::Integer(2)][..])
    );

    let partial = result.dictionary.field("partial").unwrap();
    assert_eq!(partial.encodings.get(&Scalar::Integer(1)), Some("One"));
    assert!(partial.enum_values().is_none());

    let unlabelled = result.dictionary.field("unlabelled").unwrap();
    assert_eq!(unlabelled.field_type, FieldType::Number);
    assert!(unlabelled.encodings.is_empty());
    assert!(unlabelled.enum_values().is_none());

    let names = |fields: &[vlmd_model::Field]| {
        fields.iter().map(|f| f.name.clone()).collect::<Vec<_>>()
    };
    assert_eq!(names(&result.tabular_fields), ["complete", "partial", "unlabelled"]);
    assert_eq!(names(&result.nested_fields), ["complete", "partial", "unlabelled"]);
    assert_eq!(
        result.nested["data_dictionary"][0]["constraints"]["enum"],
        serde_json::json!([1, 2])
    );
}

#[test]
fn outputs_are_written_when_a_directory_is_given() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("labels.sav");
    labelled_survey(&input);
    let out = dir.path().join("out");
    fs::create_dir(&out).unwrap();

    let options = ConvertOptions::new()
        .with_props(DictionaryProps::new().with_title("Labelled survey"))
        .with_output_dir(&out);
    let result = convert(&input, &options).unwrap();
    assert_eq!(result.dictionary.title, "Labelled survey");

    let paths = OutputPaths::in_dir(&out);
    let nested: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&paths.nested).unwrap()).unwrap();
    assert_eq!(nested, result.nested);
    let csv = fs::read_to_string(&paths.tabular).unwrap();
    assert_eq!(csv.lines().count(), 4);
    assert!(paths.validation_errors.is_file());
    assert!(paths.tabular_summary.is_file());
}

#[test]
fn output_directory_is_checked_before_reading_input() {
    let dir = tempfile::tempdir().unwrap();
    let missing_dir = dir.path().join("nowhere");
    let options = ConvertOptions::new().with_output_dir(&missing_dir);

    let error = convert(&dir.path().join("absent.sav"), &options).unwrap_err();
    assert!(matches!(error, ConvertError::OutputDirectoryInvalid { .. }));
    assert!(!missing_dir.exists());
}

#[test]
fn file_as_output_directory_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("labels.sav");
    labelled_survey(&input);

    let error = convert(&input, &ConvertOptions::new().with_output_dir(&input)).unwrap_err();
    assert!(matches!(error, ConvertError::OutputDirectoryInvalid { .. }));
}

#[test]
fn invalid_dictionary_is_reported_not_raised() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("template.json");
    fs::write(
        &input,
        r#"{"title": "Duplicates", "data_dictionary": [
            {"name": "id", "type": "integer"},
            {"name": "id", "type": "string"}
        ]}"#,
    )
    .unwrap();

    let result = convert(&input, &ConvertOptions::new()).unwrap();
    assert!(!result.errors.is_valid());
    assert!(
        result
            .errors
            .tabular
            .errors
            .iter()
            .any(|error| error.code == ErrorCode::UniqueError)
    );
    assert!(
        result
            .errors
            .nested
            .errors
            .iter()
            .any(|error| error.code == ErrorCode::UniqueError)
    );
    assert_eq!(result.tabular_fields.len(), 1);
}

#[test]
fn explicit_input_type_overrides_suffix() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("dictionary.txt");
    fs::write(&input, "name,type\nage,integer\n").unwrap();

    assert!(matches!(
        convert(&input, &ConvertOptions::new()),
        Err(ConvertError::Ingest(_))
    ));
    let options = ConvertOptions::new().with_input_kind(InputKind::CsvTemplate);
    let result = convert(&input, &options).unwrap();
    assert_eq!(result.dictionary.fields()[0].field_type, FieldType::Integer);
}

#[test]
fn stata_file_declares_extended_missing_codes() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("wave1.dta");
    let mut file = DtaFile::with_variables(vec![
        DtaVariable::new("employed", StorageType::Byte)
            .with_label("Employed")
            .with_value_labels("yesno"),
    ])
    .with_label_set(
        LabelSet::new("yesno")
            .with_label(DtaValue::number(1.0), "Yes")
            .with_label(DtaValue::number(0.0), "No")
            .with_label(DtaValue::extended_missing('n'), "Not asked"),
    );
    for value in [
        DtaValue::number(1.0),
        DtaValue::number(0.0),
        DtaValue::extended_missing('n'),
    ] {
        file.add_row(vec![value]);
    }
    write_dta(&input, &file).unwrap();

    let result = convert(&input, &ConvertOptions::new()).unwrap();
    assert!(result.errors.is_valid());
    assert_eq!(result.dictionary.title, "wave1");
    assert_eq!(
        result.nested["data_dictionary"][0],
        serde_json::json!({
            "name": "employed",
            "type": "integer",
            "description": "Employed",
            "encodings": {"1": "Yes", "0": "No", ".n": "Not asked"},
            "missingValues": [".n"],
            "constraints": {"enum": [1, 0]}
        })
    );
}
