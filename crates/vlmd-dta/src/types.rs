//! Core types for Stata data files.

use std::fmt;

/// Byte order of multi-byte fields (`LSF` or `MSF` in the header).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ByteOrder {
    /// Least significant byte first.
    #[default]
    Little,
    /// Most significant byte first.
    Big,
}

impl ByteOrder {
    pub fn tag(self) -> &'static str {
        match self {
            Self::Little => "LSF",
            Self::Big => "MSF",
        }
    }

    pub fn from_tag(tag: &[u8]) -> Option<Self> {
        match tag {
            b"LSF" => Some(Self::Little),
            b"MSF" => Some(Self::Big),
            _ => None,
        }
    }
}

/// Format release of a tagged (Stata 13 and later) data file.
///
/// The releases differ only in field widths: 117 stores Latin-1 text in
/// short fields, 118 moves to UTF-8 and wider fields, 119 widens the
/// variable count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Release {
    R117,
    #[default]
    R118,
    R119,
}

impl Release {
    pub fn from_number(number: u16) -> Option<Self> {
        match number {
            117 => Some(Self::R117),
            118 => Some(Self::R118),
            119 => Some(Self::R119),
            _ => None,
        }
    }

    pub fn number(self) -> u16 {
        match self {
            Self::R117 => 117,
            Self::R118 => 118,
            Self::R119 => 119,
        }
    }

    /// Text is UTF-8 from release 118 on, Latin-1 before.
    pub fn is_utf8(self) -> bool {
        self != Self::R117
    }

    /// Width of variable and value label set names, including the NUL.
    pub(crate) fn name_len(self) -> usize {
        if self.is_utf8() { 129 } else { 33 }
    }

    pub(crate) fn format_len(self) -> usize {
        if self.is_utf8() { 57 } else { 49 }
    }

    pub(crate) fn variable_label_len(self) -> usize {
        if self.is_utf8() { 321 } else { 81 }
    }

    /// Bytes of the dataset label length prefix.
    pub(crate) fn label_len_width(self) -> usize {
        if self.is_utf8() { 2 } else { 1 }
    }

    /// Bytes of the variable count in `<K>`.
    pub(crate) fn variable_count_width(self) -> usize {
        if self == Self::R119 { 4 } else { 2 }
    }

    /// Bytes of the observation count in `<N>`.
    pub(crate) fn observation_count_width(self) -> usize {
        if self == Self::R117 { 4 } else { 8 }
    }

    pub(crate) fn sortlist_entry_width(self) -> usize {
        if self == Self::R119 { 4 } else { 2 }
    }

    /// Bytes of the observation number in a `GSO` record.
    pub(crate) fn strl_observation_width(self) -> usize {
        if self == Self::R117 { 4 } else { 8 }
    }
}

/// Storage type of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageType {
    Byte,
    Int,
    Long,
    Float,
    Double,
    /// Fixed-width string of 1 to 2045 bytes.
    Str(u16),
    /// Long string stored in the `<strls>` section.
    StrL,
}

impl StorageType {
    pub const MAX_STR_WIDTH: u16 = 2045;

    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            1..=Self::MAX_STR_WIDTH => Some(Self::Str(code)),
            32768 => Some(Self::StrL),
            65526 => Some(Self::Double),
            65527 => Some(Self::Float),
            65528 => Some(Self::Long),
            65529 => Some(Self::Int),
            65530 => Some(Self::Byte),
            _ => None,
        }
    }

    pub fn code(self) -> u16 {
        match self {
            Self::Str(width) => width,
            Self::StrL => 32768,
            Self::Double => 65526,
            Self::Float => 65527,
            Self::Long => 65528,
            Self::Int => 65529,
            Self::Byte => 65530,
        }
    }

    /// Bytes one value occupies in the `<data>` section.
    pub fn width(self) -> usize {
        match self {
            Self::Byte => 1,
            Self::Int => 2,
            Self::Long | Self::Float => 4,
            Self::Double | Self::StrL => 8,
            Self::Str(width) => usize::from(width),
        }
    }

    pub fn is_numeric(self) -> bool {
        !matches!(self, Self::Str(_) | Self::StrL)
    }

    pub fn is_integer(self) -> bool {
        matches!(self, Self::Byte | Self::Int | Self::Long)
    }

    /// Display format Stata assigns to new variables of this type.
    pub fn default_format(self) -> String {
        match self {
            Self::Byte | Self::Int => "%8.0g".to_string(),
            Self::Long => "%12.0g".to_string(),
            Self::Float => "%9.0g".to_string(),
            Self::Double => "%10.0g".to_string(),
            Self::Str(width) => format!("%{width}s"),
            Self::StrL => "%9s".to_string(),
        }
    }
}

/// Stata missing value: `.` or one of the extended codes `.a` to `.z`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MissingCode {
    System,
    /// Index 0 is `.a`, 25 is `.z`.
    Extended(u8),
}

impl MissingCode {
    pub fn extended(letter: char) -> Option<Self> {
        letter
            .is_ascii_lowercase()
            .then(|| Self::Extended(letter as u8 - b'a'))
    }

    pub fn letter(self) -> Option<char> {
        match self {
            Self::System => None,
            Self::Extended(index) => Some(char::from(b'a' + index)),
        }
    }

    /// Position after the largest valid value: 0 for `.`, 1 for `.a`.
    pub(crate) fn offset(self) -> u8 {
        match self {
            Self::System => 0,
            Self::Extended(index) => index + 1,
        }
    }

    pub(crate) fn from_offset(offset: u64) -> Option<Self> {
        match offset {
            0 => Some(Self::System),
            1..=26 => u8::try_from(offset - 1).ok().map(Self::Extended),
            _ => None,
        }
    }
}

impl fmt::Display for MissingCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.letter() {
            Some(letter) => write!(f, ".{letter}"),
            None => f.write_str("."),
        }
    }
}

/// A single cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum DtaValue {
    Number(f64),
    Text(String),
    Missing(MissingCode),
}

impl DtaValue {
    pub fn number(value: f64) -> Self {
        Self::Number(value)
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn missing() -> Self {
        Self::Missing(MissingCode::System)
    }

    /// Extended missing value `.a` to `.z`; `.` for any other letter.
    pub fn extended_missing(letter: char) -> Self {
        Self::Missing(MissingCode::extended(letter).unwrap_or(MissingCode::System))
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            _ => None,
        }
    }

    pub fn missing_code(&self) -> Option<MissingCode> {
        match self {
            Self::Missing(code) => Some(*code),
            _ => None,
        }
    }
}

/// Calendar meaning of a `%t` display format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemporalKind {
    /// `%td`: days since 1960-01-01.
    Date,
    /// `%tc` / `%tC`: milliseconds since 1960-01-01 00:00:00.
    Datetime,
}

/// Variable definition.
#[derive(Debug, Clone, PartialEq)]
pub struct DtaVariable {
    pub name: String,
    pub storage: StorageType,
    pub format: String,
    pub label: Option<String>,
    /// Name of the value label set attached to this variable.
    pub value_label_set: Option<String>,
}

impl DtaVariable {
    pub fn new(name: impl Into<String>, storage: StorageType) -> Self {
        Self {
            name: name.into(),
            storage,
            format: storage.default_format(),
            label: None,
            value_label_set: None,
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    #[must_use]
    pub fn with_value_labels(mut self, set: impl Into<String>) -> Self {
        self.value_label_set = Some(set.into());
        self
    }

    /// Calendar kind implied by the display format, if any.
    pub fn temporal_kind(&self) -> Option<TemporalKind> {
        let pattern = self.format.trim().strip_prefix('%')?;
        let pattern = pattern.strip_prefix('-').unwrap_or(pattern);
        if pattern.starts_with("td") || pattern.starts_with('d') {
            Some(TemporalKind::Date)
        } else if pattern.starts_with("tc") || pattern.starts_with("tC") {
            Some(TemporalKind::Datetime)
        } else {
            None
        }
    }
}

/// A named value label set. Keys are integers or missing codes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LabelSet {
    pub name: String,
    pub entries: Vec<(DtaValue, String)>,
}

impl LabelSet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_label(mut self, value: DtaValue, label: impl Into<String>) -> Self {
        self.entries.push((value, label.into()));
        self
    }
}

/// Header fields that are not per-variable.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DtaHeader {
    pub release: Release,
    pub byte_order: ByteOrder,
    /// Dataset label.
    pub label: Option<String>,
    pub timestamp: Option<String>,
}

/// A complete data file: header, variables, value labels and rows.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DtaFile {
    pub header: DtaHeader,
    pub variables: Vec<DtaVariable>,
    pub label_sets: Vec<LabelSet>,
    pub rows: Vec<Vec<DtaValue>>,
}

impl DtaFile {
    pub fn with_variables(variables: Vec<DtaVariable>) -> Self {
        Self {
            variables,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_label_set(mut self, set: LabelSet) -> Self {
        self.label_sets.push(set);
        self
    }

    pub fn add_row(&mut self, row: Vec<DtaValue>) {
        self.rows.push(row);
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Values of the variable at `index`, in row order.
    pub fn column(&self, index: usize) -> impl Iterator<Item = &DtaValue> + '_ {
        self.rows.iter().filter_map(move |row| row.get(index))
    }

    pub fn label_set(&self, name: &str) -> Option<&LabelSet> {
        self.label_sets.iter().find(|set| set.name == name)
    }

    /// Value labels attached to `variable`.
    pub fn value_labels(&self, variable: &DtaVariable) -> Option<&LabelSet> {
        variable
            .value_label_set
            .as_deref()
            .and_then(|name| self.label_set(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_codes() {
        for storage in [
            StorageType::Byte,
            StorageType::Int,
            StorageType::Long,
            StorageType::Float,
            StorageType::Double,
            StorageType::Str(1),
            StorageType::Str(2045),
            StorageType::StrL,
        ] {
            assert_eq!(StorageType::from_code(storage.code()), Some(storage));
        }
        assert_eq!(StorageType::from_code(0), None);
        assert_eq!(StorageType::from_code(2046), None);
        assert_eq!(StorageType::Str(12).width(), 12);
        assert!(StorageType::Byte.is_integer());
        assert!(!StorageType::Double.is_integer());
        assert!(!StorageType::StrL.is_numeric());
    }

    #[test]
    fn missing_code_display() {
        assert_eq!(MissingCode::System.to_string(), ".");
        assert_eq!(MissingCode::extended('a').map(|c| c.to_string()), Some(".a".to_string()));
        assert_eq!(MissingCode::extended('z').map(|c| c.to_string()), Some(".z".to_string()));
        assert_eq!(MissingCode::extended('A'), None);
        assert!(MissingCode::System < MissingCode::Extended(0));
        assert_eq!(DtaValue::extended_missing('!'), DtaValue::missing());
    }

    #[test]
    fn temporal_formats() {
        let var = |format: &str| DtaVariable::new("x", StorageType::Double).with_format(format);
        assert_eq!(var("%td").temporal_kind(), Some(TemporalKind::Date));
        assert_eq!(var("%tdCCYY-NN-DD").temporal_kind(), Some(TemporalKind::Date));
        assert_eq!(var("%-td").temporal_kind(), Some(TemporalKind::Date));
        assert_eq!(var("%d").temporal_kind(), Some(TemporalKind::Date));
        assert_eq!(var("%tc").temporal_kind(), Some(TemporalKind::Datetime));
        assert_eq!(var("%tC").temporal_kind(), Some(TemporalKind::Datetime));
        assert_eq!(var("%tm").temporal_kind(), None);
        assert_eq!(var("%9.0g").temporal_kind(), None);
    }

    #[test]
    fn value_labels_follow_the_attached_set() {
        let smoker = DtaVariable::new("smoker", StorageType::Byte).with_value_labels("yesno");
        let file = DtaFile::with_variables(vec![smoker.clone()])
            .with_label_set(LabelSet::new("yesno").with_label(DtaValue::number(1.0), "Yes"));
        assert_eq!(file.value_labels(&smoker).map(|set| set.entries.len()), Some(1));
        assert!(file.value_labels(&DtaVariable::new("id", StorageType::Long)).is_none());
    }
}
