//! Core SPSS system file types.

use crate::error::{Result, SavError};

/// Byte order of a system file, detected from the layout code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Endian {
    #[default]
    Little,
    Big,
}

/// Case data compression scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    #[default]
    None,
    /// Bytecode compression (the SPSS default).
    Bytecode,
}

impl Compression {
    pub fn from_code(code: i32) -> Result<Self> {
        match code {
            0 => Ok(Compression::None),
            1 => Ok(Compression::Bytecode),
            other => Err(SavError::UnsupportedCompression { code: other }),
        }
    }

    pub fn code(self) -> i32 {
        match self {
            Compression::None => 0,
            Compression::Bytecode => 1,
        }
    }
}

/// Whether a numeric print format denotes a calendar value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemporalKind {
    Date,
    Datetime,
}

/// Packed print/write format (`type << 16 | width << 8 | decimals`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrintFormat {
    pub format_type: u8,
    pub width: u8,
    pub decimals: u8,
}

/// Format type codes used by this crate.
pub mod format_codes {
    pub const A: u8 = 1;
    pub const F: u8 = 5;
    pub const DATE: u8 = 20;
    pub const DATETIME: u8 = 22;
    pub const ADATE: u8 = 23;
    pub const JDATE: u8 = 24;
    pub const MOYR: u8 = 28;
    pub const QYR: u8 = 29;
    pub const WKYR: u8 = 30;
    pub const EDATE: u8 = 38;
    pub const SDATE: u8 = 39;
    pub const YMDHMS: u8 = 41;
}

impl PrintFormat {
    pub fn from_packed(raw: i32) -> Self {
        Self {
            format_type: ((raw >> 16) & 0xff) as u8,
            width: ((raw >> 8) & 0xff) as u8,
            decimals: (raw & 0xff) as u8,
        }
    }

    pub fn to_packed(self) -> i32 {
        (i32::from(self.format_type) << 16) | (i32::from(self.width) << 8) | i32::from(self.decimals)
    }

    /// `F{width}.{decimals}`.
    pub fn numeric(width: u8, decimals: u8) -> Self {
        Self {
            format_type: format_codes::F,
            width,
            decimals,
        }
    }

    /// `A{width}`.
    pub fn string(width: u16) -> Self {
        Self {
            format_type: format_codes::A,
            width: width.min(255) as u8,
            decimals: 0,
        }
    }

    /// `DATE11`.
    pub fn date() -> Self {
        Self {
            format_type: format_codes::DATE,
            width: 11,
            decimals: 0,
        }
    }

    /// `DATETIME20`.
    pub fn datetime() -> Self {
        Self {
            format_type: format_codes::DATETIME,
            width: 20,
            decimals: 0,
        }
    }

    /// Calendar interpretation of this format, if any. Time-of-day and
    /// duration formats stay plain numbers.
    pub fn temporal_kind(self) -> Option<TemporalKind> {
        use format_codes::{
            ADATE, DATE, DATETIME, EDATE, JDATE, MOYR, QYR, SDATE, WKYR, YMDHMS,
        };
        match self.format_type {
            DATE | ADATE | JDATE | MOYR | QYR | WKYR | EDATE | SDATE => Some(TemporalKind::Date),
            DATETIME | YMDHMS => Some(TemporalKind::Datetime),
            _ => None,
        }
    }
}

/// Storage type of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarType {
    Numeric,
    /// Fixed-width string, 1..=255 bytes.
    String { width: u16 },
}

impl VarType {
    /// Number of 8-byte case elements the variable occupies.
    pub fn segments(self) -> usize {
        match self {
            VarType::Numeric => 1,
            VarType::String { width } => usize::from(width).div_ceil(8).max(1),
        }
    }

    /// Raw `type` field of the variable record.
    pub fn raw_type(self) -> i32 {
        match self {
            VarType::Numeric => 0,
            VarType::String { width } => i32::from(width),
        }
    }
}

/// A single cell, value label key or missing-value code.
#[derive(Debug, Clone, PartialEq)]
pub enum SavValue {
    /// Numeric value; `None` is system-missing.
    Numeric(Option<f64>),
    /// String value with trailing padding removed.
    String(String),
}

impl SavValue {
    pub fn numeric(value: f64) -> Self {
        SavValue::Numeric(Some(value))
    }

    pub fn sysmis() -> Self {
        SavValue::Numeric(None)
    }

    pub fn string(value: impl Into<String>) -> Self {
        SavValue::String(value.into())
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SavValue::Numeric(value) => *value,
            SavValue::String(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SavValue::String(value) => Some(value),
            SavValue::Numeric(_) => None,
        }
    }
}

/// User-missing declarations of one variable.
///
/// The format allows up to three discrete values, or one range plus at most
/// one discrete value (numeric variables only).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MissingValues {
    pub discrete: Vec<SavValue>,
    pub range: Option<(f64, f64)>,
}

impl MissingValues {
    pub fn is_empty(&self) -> bool {
        self.discrete.is_empty() && self.range.is_none()
    }

    /// Raw `n_missing_values` field of the variable record.
    pub fn record_code(&self) -> i32 {
        match self.range {
            Some(_) if self.discrete.is_empty() => -2,
            Some(_) => -3,
            None => self.discrete.len() as i32,
        }
    }
}

/// Variable metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct SavVariable {
    /// Variable name (the long name when the file carries one).
    pub name: String,
    /// Eight-character dictionary name.
    pub short_name: String,
    pub var_type: VarType,
    pub label: Option<String>,
    pub print_format: PrintFormat,
    pub write_format: PrintFormat,
    pub missing: MissingValues,
    /// Value labels in file order.
    pub value_labels: Vec<(SavValue, String)>,
}

impl SavVariable {
    /// Create a numeric variable with an `F8.2` format.
    pub fn numeric(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            short_name: name.clone(),
            name,
            var_type: VarType::Numeric,
            label: None,
            print_format: PrintFormat::numeric(8, 2),
            write_format: PrintFormat::numeric(8, 2),
            missing: MissingValues::default(),
            value_labels: Vec::new(),
        }
    }

    /// Create a string variable of the given width.
    pub fn string(name: impl Into<String>, width: u16) -> Self {
        let name = name.into();
        Self {
            short_name: name.clone(),
            name,
            var_type: VarType::String { width },
            label: None,
            print_format: PrintFormat::string(width),
            write_format: PrintFormat::string(width),
            missing: MissingValues::default(),
            value_labels: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub fn with_format(mut self, format: PrintFormat) -> Self {
        self.print_format = format;
        self.write_format = format;
        self
    }

    #[must_use]
    pub fn with_value_label(mut self, value: SavValue, label: impl Into<String>) -> Self {
        self.value_labels.push((value, label.into()));
        self
    }

    #[must_use]
    pub fn with_missing_values(mut self, values: Vec<SavValue>) -> Self {
        self.missing.discrete = values;
        self
    }

    #[must_use]
    pub fn with_missing_range(mut self, lo: f64, hi: f64) -> Self {
        self.missing.range = Some((lo, hi));
        self
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self.var_type, VarType::Numeric)
    }
}

/// Special floating-point values declared by the writing machine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloatInfo {
    pub sysmis: f64,
    pub highest: f64,
    pub lowest: f64,
}

impl Default for FloatInfo {
    fn default() -> Self {
        Self {
            sysmis: -f64::MAX,
            highest: f64::MAX,
            lowest: f64::from_bits(0xffef_ffff_ffff_fffe),
        }
    }
}

/// File header fields that survive parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct FileHeader {
    pub product: String,
    pub endian: Endian,
    pub compression: Compression,
    pub case_count: Option<usize>,
    pub bias: f64,
    pub creation_date: String,
    pub creation_time: String,
    pub file_label: Option<String>,
}

impl Default for FileHeader {
    fn default() -> Self {
        Self {
            product: String::from("@(#) SPSS DATA FILE vlmd-sav"),
            endian: Endian::Little,
            compression: Compression::None,
            case_count: None,
            bias: 100.0,
            creation_date: String::from("01 Jan 24"),
            creation_time: String::from("00:00:00"),
            file_label: None,
        }
    }
}

/// A parsed system file: dictionary plus case data.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SavFile {
    pub header: FileHeader,
    pub variables: Vec<SavVariable>,
    /// Character encoding named by the file, if any.
    pub encoding: Option<String>,
    pub float_info: FloatInfo,
    /// Cases in variable order.
    pub rows: Vec<Vec<SavValue>>,
}

impl SavFile {
    pub fn with_variables(variables: Vec<SavVariable>) -> Self {
        Self {
            variables,
            ..Self::default()
        }
    }

    pub fn add_row(&mut self, row: Vec<SavValue>) {
        self.rows.push(row);
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Total 8-byte elements per case.
    pub fn case_size(&self) -> usize {
        self.variables.iter().map(|var| var.var_type.segments()).sum()
    }

    pub fn variable(&self, name: &str) -> Option<&SavVariable> {
        self.variables.iter().find(|var| var.name == name)
    }

    /// Values of one variable across all cases.
    pub fn column(&self, index: usize) -> impl Iterator<Item = &SavValue> {
        self.rows.iter().filter_map(move |row| row.get(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_packs_and_unpacks() {
        let format = PrintFormat::numeric(8, 2);
        assert_eq!(format.to_packed(), 0x0005_0802);
        assert_eq!(PrintFormat::from_packed(0x0005_0802), format);
        assert_eq!(PrintFormat::date().temporal_kind(), Some(TemporalKind::Date));
        assert_eq!(
            PrintFormat::datetime().temporal_kind(),
            Some(TemporalKind::Datetime)
        );
        assert_eq!(format.temporal_kind(), None);
    }

    #[test]
    fn string_segments() {
        assert_eq!(VarType::Numeric.segments(), 1);
        assert_eq!(VarType::String { width: 1 }.segments(), 1);
        assert_eq!(VarType::String { width: 8 }.segments(), 1);
        assert_eq!(VarType::String { width: 9 }.segments(), 2);
        assert_eq!(VarType::String { width: 255 }.segments(), 32);
    }

    #[test]
    fn missing_record_codes() {
        let mut missing = MissingValues::default();
        assert_eq!(missing.record_code(), 0);
        missing.discrete = vec![SavValue::numeric(9.0), SavValue::numeric(99.0)];
        assert_eq!(missing.record_code(), 2);
        missing.range = Some((97.0, 99.0));
        assert_eq!(missing.record_code(), -3);
        missing.discrete.clear();
        assert_eq!(missing.record_code(), -2);
    }

    #[test]
    fn unsupported_compression_code() {
        assert!(matches!(
            Compression::from_code(2),
            Err(SavError::UnsupportedCompression { code: 2 })
        ));
    }
}
