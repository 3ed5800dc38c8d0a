//! Parsing of nested attributes stored in tabular cells.
//!
//! Cells written by this crate hold compact JSON. Hand-written templates may
//! also use the pipe forms `1=Yes|2=No` (encodings) and `9|99` (lists).

use vlmd_model::{Encodings, Scalar};

/// Render encodings as a cell; empty encodings give an empty cell.
pub fn encodings_cell(encodings: &Encodings) -> Result<String, serde_json::Error> {
    if encodings.is_empty() {
        return Ok(String::new());
    }
    serde_json::to_string(encodings)
}

/// Render a value list as a cell; an empty list gives an empty cell.
pub fn scalar_list_cell(values: &[Scalar]) -> Result<String, serde_json::Error> {
    if values.is_empty() {
        return Ok(String::new());
    }
    serde_json::to_string(values)
}

pub fn parse_encodings(cell: &str) -> Result<Encodings, String> {
    let cell = cell.trim();
    if cell.is_empty() {
        return Ok(Encodings::new());
    }
    if cell.starts_with('{') {
        return serde_json::from_str(cell).map_err(|e| format!("invalid encodings JSON: {e}"));
    }
    let mut encodings = Encodings::new();
    for item in cell.split('|') {
        let Some((value, label)) = item.split_once('=') else {
            return Err(format!("encoding '{}' is not of the form value=label", item.trim()));
        };
        encodings.insert(Scalar::parse_text(value.trim()), label.trim());
    }
    Ok(encodings)
}

pub fn parse_scalar_list(cell: &str) -> Result<Vec<Scalar>, String> {
    let cell = cell.trim();
    if cell.is_empty() {
        return Ok(Vec::new());
    }
    if cell.starts_with('[') {
        return serde_json::from_str(cell).map_err(|e| format!("invalid JSON list: {e}"));
    }
    Ok(cell
        .split('|')
        .map(|item| Scalar::parse_text(item.trim()))
        .collect())
}
