//! Dictionary record parsing.
//!
//! | Type | Record                                             |
//! |------|----------------------------------------------------|
//! | 2    | Variable (one per 8-byte case element)             |
//! | 3    | Value labels, always followed by a type 4 record   |
//! | 4    | Variable indexes the preceding labels apply to     |
//! | 6    | Document lines (80 bytes each)                     |
//! | 7    | Extension, identified by subtype                   |
//! | 999  | Dictionary terminator                              |
//!
//! Extensions read here are float info (subtype 4), long variable names
//! (subtype 13) and character encoding (subtype 20); all others are skipped.

use crate::error::{Result, SavError};
use crate::header::cursor::{ByteCursor, decode_f64, decode_text};
use crate::types::{FloatInfo, MissingValues, PrintFormat, SavValue, SavVariable, VarType};

pub const RECORD_VARIABLE: i32 = 2;
pub const RECORD_VALUE_LABELS: i32 = 3;
pub const RECORD_VALUE_LABEL_VARS: i32 = 4;
pub const RECORD_DOCUMENT: i32 = 6;
pub const RECORD_EXTENSION: i32 = 7;
pub const RECORD_TERMINATOR: i32 = 999;

pub const SUBTYPE_FLOAT_INFO: i32 = 4;
pub const SUBTYPE_LONG_NAMES: i32 = 13;
pub const SUBTYPE_ENCODING: i32 = 20;

const DOCUMENT_LINE_LEN: usize = 80;

/// Everything the dictionary declares.
#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    pub variables: Vec<SavVariable>,
    pub encoding: Option<String>,
    pub float_info: FloatInfo,
    pub documents: Vec<String>,
}

impl Dictionary {
    /// Storage layout of one case.
    pub fn layout(&self) -> Vec<VarType> {
        self.variables.iter().map(|var| var.var_type).collect()
    }
}

/// Parse dictionary records up to and including the terminator.
pub fn parse_dictionary(cursor: &mut ByteCursor<'_>) -> Result<Dictionary> {
    let mut dictionary = Dictionary::default();
    // One entry per case element: the owning variable for first segments,
    // `None` for string continuations.
    let mut slots: Vec<Option<usize>> = Vec::new();
    let mut long_names: Option<String> = None;

    loop {
        let offset = cursor.position();
        let record_type = cursor.read_i32()?;
        match record_type {
            RECORD_VARIABLE => parse_variable(cursor, &mut dictionary.variables, &mut slots)?,
            RECORD_VALUE_LABELS => {
                parse_value_labels(cursor, &mut dictionary.variables, &slots)?;
            }
            RECORD_DOCUMENT => {
                let lines = cursor.read_count("document line count")?;
                for _ in 0..lines {
                    dictionary
                        .documents
                        .push(decode_text(cursor.take(DOCUMENT_LINE_LEN)?));
                }
            }
            RECORD_EXTENSION => parse_extension(cursor, &mut dictionary, &mut long_names)?,
            RECORD_TERMINATOR => {
                cursor.read_i32()?;
                break;
            }
            other => {
                return Err(SavError::UnknownRecord {
                    record_type: other,
                    offset,
                });
            }
        }
    }

    if let Some(text) = long_names {
        apply_long_names(&mut dictionary.variables, &text);
    }
    Ok(dictionary)
}

fn parse_variable(
    cursor: &mut ByteCursor<'_>,
    variables: &mut Vec<SavVariable>,
    slots: &mut Vec<Option<usize>>,
) -> Result<()> {
    let index = variables.len();
    let raw_type = cursor.read_i32()?;
    let has_label = cursor.read_i32()?;
    let missing_code = cursor.read_i32()?;
    let print_format = PrintFormat::from_packed(cursor.read_i32()?);
    let write_format = PrintFormat::from_packed(cursor.read_i32()?);
    let short_name = decode_text(cursor.take(8)?);

    let label = if has_label == 1 {
        let len = cursor.read_count("label length")?;
        let bytes = cursor.take(len.div_ceil(4) * 4)?;
        Some(decode_text(&bytes[..len])).filter(|label| !label.is_empty())
    } else {
        None
    };

    let missing_count = missing_code.unsigned_abs() as usize;
    if missing_count > 3 || missing_code == -1 {
        return Err(SavError::invalid_variable(
            index,
            format!("invalid missing value code {missing_code}"),
        ));
    }
    let mut raw_missing = Vec::with_capacity(missing_count);
    for _ in 0..missing_count {
        raw_missing.push(cursor.read_array8()?);
    }

    let var_type = match raw_type {
        -1 => {
            slots.push(None);
            return Ok(());
        }
        0 => VarType::Numeric,
        width @ 1..=255 => VarType::String {
            width: width as u16,
        },
        other => {
            return Err(SavError::invalid_variable(
                index,
                format!("unsupported variable type {other}"),
            ));
        }
    };

    let missing = decode_missing(index, missing_code, &raw_missing, var_type, cursor)?;
    slots.push(Some(index));
    variables.push(SavVariable {
        name: short_name.clone(),
        short_name,
        var_type,
        label,
        print_format,
        write_format,
        missing,
        value_labels: Vec::new(),
    });
    Ok(())
}

fn decode_missing(
    index: usize,
    code: i32,
    raw: &[[u8; 8]],
    var_type: VarType,
    cursor: &ByteCursor<'_>,
) -> Result<MissingValues> {
    let endian = cursor.endian();
    let decode = |bytes: &[u8; 8]| match var_type {
        VarType::Numeric => SavValue::numeric(decode_f64(*bytes, endian)),
        VarType::String { .. } => SavValue::String(decode_text(bytes)),
    };

    if code >= 0 {
        return Ok(MissingValues {
            discrete: raw.iter().map(decode).collect(),
            range: None,
        });
    }
    if !matches!(var_type, VarType::Numeric) {
        return Err(SavError::invalid_variable(
            index,
            "missing value range on a string variable",
        ));
    }
    let lo = decode_f64(raw[0], endian);
    let hi = decode_f64(raw[1], endian);
    Ok(MissingValues {
        discrete: raw.get(2).map(decode).into_iter().collect(),
        range: Some((lo, hi)),
    })
}

fn parse_value_labels(
    cursor: &mut ByteCursor<'_>,
    variables: &mut [SavVariable],
    slots: &[Option<usize>],
) -> Result<()> {
    let count = cursor.read_count("value label count")?;
    let mut entries = Vec::with_capacity(count);
    for _ in 0..count {
        let raw = cursor.read_array8()?;
        let len = usize::from(cursor.read_u8()?);
        // Length byte plus label are padded to a multiple of 8.
        let bytes = cursor.take((len + 1).div_ceil(8) * 8 - 1)?;
        entries.push((raw, decode_text(&bytes[..len])));
    }

    let offset = cursor.position();
    if cursor.read_i32()? != RECORD_VALUE_LABEL_VARS {
        return Err(SavError::invalid_value_labels(format!(
            "label record not followed by a variable index record at offset {offset}"
        )));
    }
    let var_count = cursor.read_count("value label variable count")?;
    let endian = cursor.endian();
    for _ in 0..var_count {
        // 1-based element index, counting string continuations.
        let element = cursor.read_i32()?;
        let target = usize::try_from(element)
            .ok()
            .and_then(|element| element.checked_sub(1))
            .and_then(|slot| slots.get(slot).copied().flatten())
            .ok_or_else(|| {
                SavError::invalid_value_labels(format!(
                    "labels refer to invalid variable index {element}"
                ))
            })?;
        let variable = &mut variables[target];
        for (raw, label) in &entries {
            let value = match variable.var_type {
                VarType::Numeric => SavValue::numeric(decode_f64(*raw, endian)),
                VarType::String { .. } => SavValue::String(decode_text(raw)),
            };
            variable.value_labels.push((value, label.clone()));
        }
    }
    Ok(())
}

fn parse_extension(
    cursor: &mut ByteCursor<'_>,
    dictionary: &mut Dictionary,
    long_names: &mut Option<String>,
) -> Result<()> {
    let subtype = cursor.read_i32()?;
    let size = cursor.read_count("extension element size")?;
    let count = cursor.read_count("extension element count")?;
    let len = size
        .checked_mul(count)
        .ok_or_else(|| SavError::invalid_format(format!("extension {subtype} is too large")))?;
    let data = cursor.take(len)?;

    match subtype {
        SUBTYPE_FLOAT_INFO if size == 8 && count == 3 => {
            let endian = cursor.endian();
            let value = |i: usize| {
                let mut bytes = [0u8; 8];
                bytes.copy_from_slice(&data[i * 8..i * 8 + 8]);
                decode_f64(bytes, endian)
            };
            dictionary.float_info = FloatInfo {
                sysmis: value(0),
                highest: value(1),
                lowest: value(2),
            };
        }
        SUBTYPE_LONG_NAMES => *long_names = Some(decode_text(data)),
        SUBTYPE_ENCODING => {
            dictionary.encoding = Some(decode_text(data)).filter(|name| !name.is_empty());
        }
        _ => {}
    }
    Ok(())
}

/// Apply `SHORT=Long` pairs separated by tabs.
fn apply_long_names(variables: &mut [SavVariable], text: &str) {
    for pair in text.split('\t') {
        let Some((short, long)) = pair.split_once('=') else {
            continue;
        };
        if long.is_empty() {
            continue;
        }
        if let Some(variable) = variables
            .iter_mut()
            .find(|var| var.short_name.eq_ignore_ascii_case(short))
        {
            variable.name = long.to_string();
        }
    }
}
