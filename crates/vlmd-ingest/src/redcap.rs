//! REDCap data dictionary export adapter.
//!
//! One field per variable row. Choice-based field types carry their codes as
//! encodings plus an enum; checkboxes expand into one 0/1 field per option.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info, warn};
use vlmd_model::{DataDictionary, DictionaryProps, Encodings, Field, FieldType, Scalar};

use crate::adapter::{SourceAdapter, resolve_props};
use crate::csv_table::{CsvTable, read_csv_table};
use crate::error::IngestError;
use crate::kind::InputKind;

static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("Invalid HTML tag regex"));

/// `code, label` with the label allowed to contain further commas.
static CHOICE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([^,]+?)\s*,\s*(.*?)\s*$").expect("Invalid choice regex"));

const CHECKBOX_SEPARATOR: &str = "___";

/// Header aliases: export label first, then the API column name.
const NAME_HEADERS: &[&str] = &["variable / field name", "field_name"];
const TYPE_HEADERS: &[&str] = &["field type", "field_type"];
const LABEL_HEADERS: &[&str] = &["field label", "field_label"];
const CHOICES_HEADERS: &[&str] = &[
    "choices, calculations, or slider labels",
    "select_choices_or_calculations",
];
const VALIDATION_HEADERS: &[&str] = &[
    "text validation type or show slider number",
    "text_validation_type_or_show_slider_number",
];

#[derive(Debug, Clone, Copy, Default)]
pub struct RedcapAdapter;

impl SourceAdapter for RedcapAdapter {
    fn kind(&self) -> InputKind {
        InputKind::RedcapCsv
    }

    fn extract(
        &self,
        path: &Path,
        props: &DictionaryProps,
        default_title: &str,
    ) -> Result<DataDictionary, IngestError> {
        let table = read_csv_table(path)?;
        let columns = RedcapColumns::locate(&table)
            .ok_or_else(|| IngestError::invalid_template(path, "no field name column in header"))?;

        let mut fields = Vec::new();
        for row in &table.rows {
            let variable = columns.variable(row);
            if variable.name.is_empty() {
                continue;
            }
            fields.extend(variable_fields(&variable));
        }

        let (title, description) = resolve_props(props, None, None, default_title);
        info!(
            path = %path.display(),
            variable_count = table.rows.len(),
            field_count = fields.len(),
            "read redcap data dictionary"
        );
        Ok(DataDictionary::new(title, fields).with_description(description))
    }
}

struct RedcapColumns {
    name: usize,
    field_type: Option<usize>,
    label: Option<usize>,
    choices: Option<usize>,
    validation: Option<usize>,
}

impl RedcapColumns {
    fn locate(table: &CsvTable) -> Option<Self> {
        let find = |aliases: &[&str]| {
            table
                .headers
                .iter()
                .position(|header| aliases.contains(&header.to_lowercase().as_str()))
        };
        Some(Self {
            name: find(NAME_HEADERS)?,
            field_type: find(TYPE_HEADERS),
            label: find(LABEL_HEADERS),
            choices: find(CHOICES_HEADERS),
            validation: find(VALIDATION_HEADERS),
        })
    }

    fn variable<'a>(&self, row: &'a [String]) -> RedcapVariable<'a> {
        let cell = |index: Option<usize>| {
            index
                .and_then(|index| row.get(index))
                .map(String::as_str)
                .unwrap_or("")
        };
        RedcapVariable {
            name: cell(Some(self.name)),
            field_type: cell(self.field_type),
            label: cell(self.label),
            choices: cell(self.choices),
            validation: cell(self.validation),
        }
    }
}

struct RedcapVariable<'a> {
    name: &'a str,
    field_type: &'a str,
    label: &'a str,
    choices: &'a str,
    validation: &'a str,
}

fn variable_fields(variable: &RedcapVariable<'_>) -> Vec<Field> {
    let label = strip_html(variable.label);
    let field_type = variable.field_type.to_ascii_lowercase();
    let fields = match field_type.as_str() {
        "descriptive" => Vec::new(),
        "text" => vec![Field::new(variable.name, validation_type(variable.validation))
            .with_description(label)],
        "yesno" => vec![boolean_choice_field(variable.name, label, "Yes", "No")],
        "truefalse" => vec![boolean_choice_field(variable.name, label, "True", "False")],
        "radio" | "dropdown" => vec![choice_field(variable.name, label, variable.choices)],
        "checkbox" => checkbox_fields(variable.name, &label, variable.choices),
        "calc" => vec![Field::new(variable.name, FieldType::Number).with_description(label)],
        "slider" => vec![Field::new(variable.name, FieldType::Integer).with_description(label)],
        "notes" | "file" | "sql" | "" => {
            vec![Field::new(variable.name, FieldType::String).with_description(label)]
        }
        other => {
            warn!(variable = variable.name, field_type = other, "unknown redcap field type");
            vec![Field::new(variable.name, FieldType::String).with_description(label)]
        }
    };
    debug!(
        variable = variable.name,
        field_type = %field_type,
        field_count = fields.len(),
        "mapped redcap variable"
    );
    fields
}

fn validation_type(validation: &str) -> FieldType {
    let validation = validation.trim().to_ascii_lowercase();
    if validation == "integer" {
        FieldType::Integer
    } else if validation.starts_with("number") {
        FieldType::Number
    } else if validation.starts_with("datetime_") {
        FieldType::Datetime
    } else if validation.starts_with("date_") {
        FieldType::Date
    } else {
        FieldType::String
    }
}

fn boolean_choice_field(name: &str, label: String, yes: &str, no: &str) -> Field {
    let encodings: Encodings = [
        (Scalar::Integer(1), yes.to_string()),
        (Scalar::Integer(0), no.to_string()),
    ]
    .into_iter()
    .collect();
    Field::new(name, FieldType::Integer)
        .with_description(label)
        .with_encodings(encodings)
        .with_enum(vec![Scalar::Integer(1), Scalar::Integer(0)])
}

fn choice_field(name: &str, label: String, choices: &str) -> Field {
    let choices = parse_choices(choices);
    let field_type = if !choices.is_empty()
        && choices
            .iter()
            .all(|(code, _)| matches!(code, Scalar::Integer(_)))
    {
        FieldType::Integer
    } else {
        FieldType::String
    };
    let codes: Vec<Scalar> = choices.iter().map(|(code, _)| code.clone()).collect();
    Field::new(name, field_type)
        .with_description(label)
        .with_encodings(choices.into_iter().collect())
        .with_enum(codes)
}

fn checkbox_fields(name: &str, label: &str, choices: &str) -> Vec<Field> {
    parse_choices(choices)
        .into_iter()
        .map(|(code, choice)| {
            let encodings: Encodings = [
                (Scalar::Integer(0), "Unchecked".to_string()),
                (Scalar::Integer(1), "Checked".to_string()),
            ]
            .into_iter()
            .collect();
            let description = if label.is_empty() {
                choice
            } else {
                format!("{label}: {choice}")
            };
            let code = code.to_string().to_lowercase().replace(['-', '.'], "_");
            Field::new(format!("{name}{CHECKBOX_SEPARATOR}{code}"), FieldType::Integer)
                .with_description(description)
                .with_encodings(encodings)
                .with_enum(vec![Scalar::Integer(0), Scalar::Integer(1)])
        })
        .collect()
}

/// Parse `1, Label | 2, Label` into codes and HTML-free labels.
fn parse_choices(choices: &str) -> Vec<(Scalar, String)> {
    choices
        .split('|')
        .filter_map(|choice| {
            let captures = CHOICE.captures(choice)?;
            let code = Scalar::parse_text(captures.get(1)?.as_str());
            Some((code, strip_html(captures.get(2)?.as_str())))
        })
        .collect()
}

fn strip_html(text: &str) -> String {
    HTML_TAG
        .replace_all(text, " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const HEADER: &str = "Variable / Field Name,Form Name,Section Header,Field Type,Field Label,\"Choices, Calculations, OR Slider Labels\",Field Note,Text Validation Type OR Show Slider Number\n";

    fn export(rows: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".redcap.csv")
            .tempfile()
            .unwrap();
        file.write_all(HEADER.as_bytes()).unwrap();
        file.write_all(rows.as_bytes()).unwrap();
        file
    }

    fn extract(rows: &str) -> DataDictionary {
        let file = export(rows);
        RedcapAdapter
            .extract(file.path(), &DictionaryProps::new(), "export")
            .unwrap()
    }

    #[test]
    fn text_validation_selects_type() {
        let dictionary = extract(
            "record_id,demo,,text,Record ID,,,\n\
             age,demo,,text,<b>Age</b> in   years,,,integer\n\
             weight,demo,,text,Weight,,,number_1dp\n\
             dob,demo,,text,Birth date,,,date_ymd\n\
             seen,demo,,text,Seen at,,,datetime_seconds_ymd\n",
        );
        let types: Vec<FieldType> = dictionary.fields().iter().map(|f| f.field_type).collect();
        assert_eq!(
            types,
            vec![
                FieldType::String,
                FieldType::Integer,
                FieldType::Number,
                FieldType::Date,
                FieldType::Datetime
            ]
        );
        assert_eq!(
            dictionary.field("age").unwrap().description.as_deref(),
            Some("Age in years")
        );
    }

    #[test]
    fn choice_fields_get_encodings_and_enum() {
        let dictionary = extract(
            "smoker,demo,,yesno,Smoker?,,,\n\
             site,demo,,radio,Site,\"1, North | 2, South, East\",,\n\
             arm,demo,,dropdown,Arm,\"A, Active | P, Placebo\",,\n",
        );
        let smoker = dictionary.field("smoker").unwrap();
        assert_eq!(smoker.field_type, FieldType::Integer);
        assert_eq!(smoker.encodings.get(&Scalar::Integer(0)), Some("No"));
        assert_eq!(
            smoker.enum_values(),
            Some(&[Scalar::Integer(1), Scalar::Integer(0)][..])
        );

        let site = dictionary.field("site").unwrap();
        assert_eq!(site.field_type, FieldType::Integer);
        assert_eq!(site.encodings.get(&Scalar::Integer(2)), Some("South, East"));

        let arm = dictionary.field("arm").unwrap();
        assert_eq!(arm.field_type, FieldType::String);
        assert_eq!(
            arm.enum_values(),
            Some(&[Scalar::string("A"), Scalar::string("P")][..])
        );
    }

    #[test]
    fn checkbox_expands_per_choice_and_descriptive_is_skipped() {
        let dictionary = extract(
            "intro,demo,,descriptive,<p>Welcome</p>,,,\n\
             race,demo,,checkbox,Race,\"1, White | 2, Black | 98, Other\",,\n",
        );
        let names: Vec<&str> = dictionary.field_names().collect();
        assert_eq!(names, vec!["race___1", "race___2", "race___98"]);
        let other = dictionary.field("race___98").unwrap();
        assert_eq!(other.description.as_deref(), Some("Race: Other"));
        assert_eq!(other.encodings.get(&Scalar::Integer(1)), Some("Checked"));
    }

    #[test]
    fn calc_and_slider_types() {
        let dictionary = extract(
            "bmi,demo,,calc,BMI,[weight]/([height]^2),,\n\
             pain,demo,,slider,Pain,,,number\n\
             comments,demo,,notes,Comments,,,\n",
        );
        assert_eq!(dictionary.field("bmi").unwrap().field_type, FieldType::Number);
        assert_eq!(dictionary.field("pain").unwrap().field_type, FieldType::Integer);
        assert_eq!(
            dictionary.field("comments").unwrap().field_type,
            FieldType::String
        );
    }

    #[test]
    fn api_header_names_are_accepted() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "field_name,field_type,field_label,select_choices_or_calculations\nq,truefalse,Q,\n"
        )
        .unwrap();
        let dictionary = RedcapAdapter
            .extract(file.path(), &DictionaryProps::new(), "api")
            .unwrap();
        assert_eq!(
            dictionary.field("q").unwrap().encodings.get(&Scalar::Integer(1)),
            Some("True")
        );
    }

    #[test]
    fn missing_name_column_is_invalid() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "label,type\nx,text\n").unwrap();
        assert!(matches!(
            RedcapAdapter.extract(file.path(), &DictionaryProps::new(), "bad"),
            Err(IngestError::InvalidTemplate { .. })
        ));
    }
}
