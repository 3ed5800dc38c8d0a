//! SAV file writer.
//!
//! Writes little-endian files with long variable names (subtype 13), float
//! info (subtype 4) and a UTF-8 encoding record (subtype 20).

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::compression::BytecodeEncoder;
use crate::error::{Result, SavError};
use crate::header::{
    RECORD_EXTENSION, RECORD_TERMINATOR, RECORD_VALUE_LABEL_VARS, RECORD_VALUE_LABELS,
    RECORD_VARIABLE, SUBTYPE_ENCODING, SUBTYPE_FLOAT_INFO, SUBTYPE_LONG_NAMES, build_file_header,
    encode_text,
};
use crate::types::{Compression, FloatInfo, SavFile, SavValue, SavVariable, VarType};

/// Writer options.
#[derive(Debug, Clone, Copy, Default)]
pub struct SavWriterOptions {
    pub compression: Compression,
}

impl SavWriterOptions {
    #[must_use]
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }
}

/// SPSS system file writer.
pub struct SavWriter<W: Write> {
    writer: BufWriter<W>,
    options: SavWriterOptions,
}

impl<W: Write> SavWriter<W> {
    pub fn new(writer: W) -> Self {
        Self::with_options(writer, SavWriterOptions::default())
    }

    pub fn with_options(writer: W, options: SavWriterOptions) -> Self {
        Self {
            writer: BufWriter::new(writer),
            options,
        }
    }

    /// Write the dictionary and all cases.
    pub fn write_file(mut self, file: &SavFile) -> Result<()> {
        validate_file(file)?;
        let short_names = assign_short_names(&file.variables);

        let mut header = file.header.clone();
        header.compression = self.options.compression;
        let mut buf = build_file_header(&header, file.case_size(), file.num_rows());

        let mut element_index = 1;
        let mut label_targets = Vec::new();
        for (variable, short_name) in file.variables.iter().zip(&short_names) {
            if !variable.value_labels.is_empty() {
                label_targets.push((variable, element_index));
            }
            write_variable(&mut buf, variable, short_name);
            element_index += variable.var_type.segments();
        }
        for (variable, index) in label_targets {
            write_value_labels(&mut buf, variable, index);
        }
        write_float_info(&mut buf, &file.float_info);
        write_long_names(&mut buf, &file.variables, &short_names);
        write_extension(&mut buf, SUBTYPE_ENCODING, 1, b"UTF-8");
        put_i32(&mut buf, RECORD_TERMINATOR);
        put_i32(&mut buf, 0);

        match self.options.compression {
            Compression::None => write_raw_cases(&mut buf, file),
            Compression::Bytecode => {
                let mut encoder = BytecodeEncoder::new(header.bias);
                for row in &file.rows {
                    for (variable, value) in file.variables.iter().zip(row) {
                        match variable.var_type {
                            VarType::Numeric => encoder.push_number(value.as_f64()),
                            VarType::String { width } => {
                                for segment in string_segments(value, width) {
                                    encoder.push_segment(segment);
                                }
                            }
                        }
                    }
                }
                buf.extend(encoder.finish());
            }
        }

        self.writer.write_all(&buf)?;
        self.writer.flush()?;
        Ok(())
    }
}

impl SavWriter<File> {
    pub fn create(path: &Path) -> Result<Self> {
        Ok(Self::new(File::create(path)?))
    }
}

/// Write a system file to a path, uncompressed.
pub fn write_sav(path: &Path, file: &SavFile) -> Result<()> {
    SavWriter::create(path)?.write_file(file)
}

/// Write a system file to a path with options.
pub fn write_sav_with_options(path: &Path, file: &SavFile, options: SavWriterOptions) -> Result<()> {
    SavWriter::with_options(File::create(path)?, options).write_file(file)
}

fn validate_file(file: &SavFile) -> Result<()> {
    let mut seen = HashSet::new();
    for (index, variable) in file.variables.iter().enumerate() {
        if variable.name.is_empty() {
            return Err(SavError::invalid_variable(index, "empty variable name"));
        }
        if !seen.insert(variable.name.to_ascii_lowercase()) {
            return Err(SavError::invalid_variable(
                index,
                format!("duplicate variable name '{}'", variable.name),
            ));
        }
        if let VarType::String { width } = variable.var_type {
            if !(1..=255).contains(&width) {
                return Err(SavError::invalid_variable(
                    index,
                    format!("string width {width} outside 1..=255"),
                ));
            }
            if width > 8 && !variable.value_labels.is_empty() {
                return Err(SavError::invalid_variable(
                    index,
                    "value labels require a string width of at most 8",
                ));
            }
            if variable.missing.range.is_some() {
                return Err(SavError::invalid_variable(
                    index,
                    "missing value ranges apply to numeric variables only",
                ));
            }
        }
        let discrete = variable.missing.discrete.len();
        if discrete > 3 || (variable.missing.range.is_some() && discrete > 1) {
            return Err(SavError::invalid_variable(
                index,
                "too many missing values declared",
            ));
        }
    }
    let expected = file.variables.len();
    for row in &file.rows {
        if row.len() != expected {
            return Err(SavError::RowLengthMismatch {
                expected,
                actual: row.len(),
            });
        }
    }
    Ok(())
}

/// Derive unique eight-character dictionary names.
fn assign_short_names(variables: &[SavVariable]) -> Vec<String> {
    let mut used = HashSet::new();
    let mut names = Vec::with_capacity(variables.len());
    for (index, variable) in variables.iter().enumerate() {
        let mut base: String = variable
            .name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
            .map(|c| c.to_ascii_uppercase())
            .take(8)
            .collect();
        if !base.starts_with(|c: char| c.is_ascii_alphabetic()) {
            base = format!("V{base}");
            base.truncate(8);
        }
        let mut candidate = base.clone();
        let mut counter = index;
        while !used.insert(candidate.clone()) {
            let suffix = counter.to_string();
            let keep = 8usize.saturating_sub(suffix.len()).min(base.len());
            candidate = format!("{}{suffix}", &base[..keep]);
            counter += 1;
        }
        names.push(candidate);
    }
    names
}

fn write_variable(buf: &mut Vec<u8>, variable: &SavVariable, short_name: &str) {
    put_i32(buf, RECORD_VARIABLE);
    put_i32(buf, variable.var_type.raw_type());
    put_i32(buf, i32::from(variable.label.is_some()));
    put_i32(buf, variable.missing.record_code());
    put_i32(buf, variable.print_format.to_packed());
    put_i32(buf, variable.write_format.to_packed());
    buf.extend(encode_text(short_name, 8));

    if let Some(label) = &variable.label {
        let len = label.len().min(255);
        put_i32(buf, len as i32);
        buf.extend(encode_text(label, len.div_ceil(4) * 4));
    }

    if let Some((lo, hi)) = variable.missing.range {
        buf.extend_from_slice(&lo.to_le_bytes());
        buf.extend_from_slice(&hi.to_le_bytes());
    }
    for value in &variable.missing.discrete {
        buf.extend_from_slice(&value_bytes(value));
    }

    for _ in 1..variable.var_type.segments() {
        put_i32(buf, RECORD_VARIABLE);
        put_i32(buf, -1);
        for _ in 0..4 {
            put_i32(buf, 0);
        }
        buf.extend_from_slice(&[b' '; 8]);
    }
}

fn write_value_labels(buf: &mut Vec<u8>, variable: &SavVariable, element_index: usize) {
    put_i32(buf, RECORD_VALUE_LABELS);
    put_i32(buf, variable.value_labels.len() as i32);
    for (value, label) in &variable.value_labels {
        buf.extend_from_slice(&value_bytes(value));
        let len = label.len().min(255);
        buf.push(len as u8);
        buf.extend(encode_text(label, (len + 1).div_ceil(8) * 8 - 1));
    }
    put_i32(buf, RECORD_VALUE_LABEL_VARS);
    put_i32(buf, 1);
    put_i32(buf, element_index as i32);
}

fn write_float_info(buf: &mut Vec<u8>, info: &FloatInfo) {
    let mut data = Vec::with_capacity(24);
    for value in [info.sysmis, info.highest, info.lowest] {
        data.extend_from_slice(&value.to_le_bytes());
    }
    write_extension(buf, SUBTYPE_FLOAT_INFO, 8, &data);
}

fn write_long_names(buf: &mut Vec<u8>, variables: &[SavVariable], short_names: &[String]) {
    let text = variables
        .iter()
        .zip(short_names)
        .map(|(variable, short)| format!("{short}={}", variable.name))
        .collect::<Vec<_>>()
        .join("\t");
    if !text.is_empty() {
        write_extension(buf, SUBTYPE_LONG_NAMES, 1, text.as_bytes());
    }
}

fn write_extension(buf: &mut Vec<u8>, subtype: i32, size: usize, data: &[u8]) {
    put_i32(buf, RECORD_EXTENSION);
    put_i32(buf, subtype);
    put_i32(buf, size as i32);
    put_i32(buf, (data.len() / size) as i32);
    buf.extend_from_slice(data);
}

fn write_raw_cases(buf: &mut Vec<u8>, file: &SavFile) {
    let sysmis = file.float_info.sysmis;
    for row in &file.rows {
        for (variable, value) in file.variables.iter().zip(row) {
            match variable.var_type {
                VarType::Numeric => {
                    let number = value.as_f64().unwrap_or(sysmis);
                    buf.extend_from_slice(&number.to_le_bytes());
                }
                VarType::String { width } => {
                    for segment in string_segments(value, width) {
                        buf.extend_from_slice(&segment);
                    }
                }
            }
        }
    }
}

fn string_segments(value: &SavValue, width: u16) -> Vec<[u8; 8]> {
    let text = value.as_str().unwrap_or_default();
    let padded = encode_text(text, usize::from(width).div_ceil(8) * 8);
    padded
        .chunks_exact(8)
        .map(|chunk| {
            let mut segment = [b' '; 8];
            segment.copy_from_slice(chunk);
            segment
        })
        .collect()
}

/// Eight-byte encoding of a label key or missing value.
fn value_bytes(value: &SavValue) -> [u8; 8] {
    match value {
        SavValue::Numeric(number) => number.unwrap_or(-f64::MAX).to_le_bytes(),
        SavValue::String(text) => {
            let mut bytes = [b' '; 8];
            bytes.copy_from_slice(&encode_text(text, 8));
            bytes
        }
    }
}

fn put_i32(buf: &mut Vec<u8>, value: i32) {
    buf.extend_from_slice(&value.to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_names_are_unique_and_uppercase() {
        let variables = vec![
            SavVariable::numeric("respondent_age"),
            SavVariable::numeric("respondent_agegroup"),
            SavVariable::numeric("2nd_visit"),
        ];
        let names = assign_short_names(&variables);
        assert_eq!(names[0], "RESPONDE");
        assert_ne!(names[1], names[0]);
        assert!(names[1].len() <= 8);
        assert_eq!(names[2], "V2ND_VIS");
    }

    #[test]
    fn rejects_row_length_mismatch() {
        let mut file = SavFile::with_variables(vec![SavVariable::numeric("a")]);
        file.add_row(vec![SavValue::numeric(1.0), SavValue::numeric(2.0)]);
        let err = SavWriter::new(Vec::new()).write_file(&file).unwrap_err();
        assert!(matches!(
            err,
            SavError::RowLengthMismatch {
                expected: 1,
                actual: 2
            }
        ));
    }

    #[test]
    fn rejects_labels_on_long_strings() {
        let file = SavFile::with_variables(vec![
            SavVariable::string("comment", 20).with_value_label(SavValue::string("x"), "X"),
        ]);
        assert!(matches!(
            SavWriter::new(Vec::new()).write_file(&file),
            Err(SavError::InvalidVariable { index: 0, .. })
        ));
    }

    #[test]
    fn string_segments_are_space_padded() {
        let segments = string_segments(&SavValue::string("hello world"), 12);
        assert_eq!(segments, vec![*b"hello wo", *b"rld     "]);
    }
}
