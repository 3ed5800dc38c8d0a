//! Flat, one-row-per-field view of a dictionary.

use std::io::{Read, Write};

use csv::{ReaderBuilder, WriterBuilder};
use vlmd_model::{Field, FieldType};

use crate::error::ViewError;
use crate::views::cells::{encodings_cell, parse_encodings, parse_scalar_list, scalar_list_cell};

pub const NAME: &str = "name";
pub const TYPE: &str = "type";
pub const DESCRIPTION: &str = "description";
pub const ENCODINGS: &str = "encodings";
pub const MISSING_VALUES: &str = "missingValues";
pub const ENUM: &str = "constraints.enum";

/// Column headers of the tabular view, in output order.
pub const TABULAR_HEADERS: [&str; 6] = [NAME, TYPE, DESCRIPTION, ENCODINGS, MISSING_VALUES, ENUM];

/// Spreadsheet row number of a data row (the header is row 1).
pub fn row_number(index: usize) -> usize {
    index + 2
}

/// Header row plus one row of text cells per field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TabularView {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TabularView {
    pub fn from_fields(fields: &[Field]) -> Result<Self, ViewError> {
        let mut rows = Vec::with_capacity(fields.len());
        for field in fields {
            rows.push(vec![
                field.name.clone(),
                field.field_type.to_string(),
                field.description.clone().unwrap_or_default(),
                encodings_cell(&field.encodings)?,
                scalar_list_cell(&field.missing_values)?,
                scalar_list_cell(&field.constraints.enumeration)?,
            ]);
        }
        Ok(Self {
            headers: TABULAR_HEADERS.iter().map(|h| (*h).to_string()).collect(),
            rows,
        })
    }

    pub fn column_index(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == header)
    }

    /// Cell of `row` under `header`; missing columns and short rows read as empty.
    pub fn cell<'a>(&self, row: &'a [String], header: &str) -> &'a str {
        self.column_index(header)
            .and_then(|index| row.get(index))
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// Parse rows back into fields. Template conveniences are accepted: a
    /// blank type reads as `string`, and cells may use the pipe forms.
    pub fn to_fields(&self) -> Result<Vec<Field>, ViewError> {
        let mut fields = Vec::with_capacity(self.rows.len());
        for (index, row) in self.rows.iter().enumerate() {
            let invalid = |column: &str, message: String| ViewError::InvalidCell {
                row: row_number(index),
                column: column.to_string(),
                message,
            };

            let name = self.cell(row, NAME).trim();
            if name.is_empty() {
                return Err(invalid(NAME, "name is empty".to_string()));
            }
            let type_cell = self.cell(row, TYPE);
            let field_type = if type_cell.trim().is_empty() {
                FieldType::String
            } else {
                type_cell.parse().map_err(|e: String| invalid(TYPE, e))?
            };
            let encodings =
                parse_encodings(self.cell(row, ENCODINGS)).map_err(|e| invalid(ENCODINGS, e))?;
            let missing = parse_scalar_list(self.cell(row, MISSING_VALUES))
                .map_err(|e| invalid(MISSING_VALUES, e))?;
            let enumeration =
                parse_scalar_list(self.cell(row, ENUM)).map_err(|e| invalid(ENUM, e))?;

            fields.push(
                Field::new(name, field_type)
                    .with_description(self.cell(row, DESCRIPTION))
                    .with_encodings(encodings)
                    .with_missing_values(missing)
                    .with_enum(enumeration),
            );
        }
        Ok(fields)
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), ViewError> {
        let mut writer = WriterBuilder::new().from_writer(writer);
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Read a CSV table; blank lines are skipped, headers and cells trimmed,
    /// and rows padded or cut to the header width.
    pub fn read_csv<R: Read>(reader: R) -> Result<Self, ViewError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);
        let mut records = Vec::new();
        for record in reader.records() {
            let row: Vec<String> = record?.iter().map(normalize_cell).collect();
            if row.iter().all(|value| value.is_empty()) {
                continue;
            }
            records.push(row);
        }
        let mut records = records.into_iter();
        let Some(headers) = records.next() else {
            return Ok(Self::default());
        };
        let width = headers.len();
        let rows = records
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Ok(Self { headers, rows })
    }
}

fn normalize_cell(raw: &str) -> String {
    raw.trim().trim_matches('\u{feff}').to_string()
}
