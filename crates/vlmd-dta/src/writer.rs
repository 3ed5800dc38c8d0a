//! DTA file writer.
//!
//! Writes any tagged release in either byte order, with the section map
//! filled in. Used mainly to build fixtures.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::cursor::{encode_label_key, encode_number, encode_str, encode_text, encode_uint};
use crate::error::{DtaError, Result};
use crate::reader::MAP_ENTRIES;
use crate::types::{ByteOrder, DtaFile, DtaValue, DtaVariable, Release, StorageType};

/// `GSO` type byte of a NUL-terminated long string.
const STRL_TEXT: u8 = 130;
/// Length of the `dd Mon yyyy hh:mm` timestamp.
const TIMESTAMP_LEN: usize = 17;

/// Stata data file writer.
pub struct DtaWriter<W: Write> {
    writer: BufWriter<W>,
}

impl<W: Write> DtaWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
        }
    }

    /// Write header, descriptors, data, long strings and value labels.
    pub fn write_file(mut self, file: &DtaFile) -> Result<()> {
        validate_file(file)?;
        let buf = encode_file(file)?;
        self.writer.write_all(&buf)?;
        self.writer.flush()?;
        Ok(())
    }
}

impl DtaWriter<File> {
    pub fn create(path: &Path) -> Result<Self> {
        Ok(Self::new(File::create(path)?))
    }
}

/// Write a data file to a path.
pub fn write_dta(path: &Path, file: &DtaFile) -> Result<()> {
    DtaWriter::create(path)?.write_file(file)
}

/// Output buffer that knows the release's field widths and byte order.
struct Output {
    buf: Vec<u8>,
    release: Release,
    order: ByteOrder,
}

impl Output {
    fn position(&self) -> u64 {
        self.buf.len() as u64
    }

    fn tag(&mut self, tag: &str) {
        self.buf.extend_from_slice(tag.as_bytes());
    }

    fn uint(&mut self, value: u64, width: usize) {
        self.buf.extend(encode_uint(value, width, self.order));
    }

    fn text(&mut self, text: &str, len: usize) {
        self.buf.extend(encode_text(text, len, self.release));
    }

    fn text_section<'a>(
        &mut self,
        tag: &str,
        texts: impl Iterator<Item = &'a str>,
        len: usize,
    ) {
        self.tag(&format!("<{tag}>"));
        for text in texts {
            self.text(text, len);
        }
        self.tag(&format!("</{tag}>"));
    }
}

fn encode_file(file: &DtaFile) -> Result<Vec<u8>> {
    let release = file.header.release;
    let mut out = Output {
        buf: Vec::new(),
        release,
        order: file.header.byte_order,
    };
    let mut map = [0u64; MAP_ENTRIES];

    out.tag("<stata_dta>");
    write_header(&mut out, file);

    map[1] = out.position();
    out.tag("<map>");
    let map_at = out.buf.len();
    out.buf.resize(map_at + MAP_ENTRIES * 8, 0);
    out.tag("</map>");

    let variables = &file.variables;
    map[2] = out.position();
    out.tag("<variable_types>");
    for variable in variables {
        out.uint(u64::from(variable.storage.code()), 2);
    }
    out.tag("</variable_types>");

    map[3] = out.position();
    let names = variables.iter().map(|v| v.name.as_str());
    out.text_section("varnames", names, release.name_len());

    map[4] = out.position();
    out.tag("<sortlist>");
    for _ in 0..=variables.len() {
        out.uint(0, release.sortlist_entry_width());
    }
    out.tag("</sortlist>");

    map[5] = out.position();
    let formats = variables.iter().map(|v| v.format.as_str());
    out.text_section("formats", formats, release.format_len());

    map[6] = out.position();
    let sets = variables
        .iter()
        .map(|v| v.value_label_set.as_deref().unwrap_or_default());
    out.text_section("value_label_names", sets, release.name_len());

    map[7] = out.position();
    let labels = variables
        .iter()
        .map(|v| v.label.as_deref().unwrap_or_default());
    out.text_section("variable_labels", labels, release.variable_label_len());

    map[8] = out.position();
    out.tag("<characteristics></characteristics>");

    map[9] = out.position();
    out.tag("<data>");
    let strls = write_rows(&mut out, file)?;
    out.tag("</data>");

    map[10] = out.position();
    out.tag("<strls>");
    for (variable, observation, text) in strls {
        out.tag("GSO");
        out.uint(variable, 4);
        out.uint(observation, release.strl_observation_width());
        out.buf.push(STRL_TEXT);
        let mut bytes = encode_str(text, release);
        bytes.push(0);
        out.uint(bytes.len() as u64, 4);
        out.buf.extend(bytes);
    }
    out.tag("</strls>");

    map[11] = out.position();
    write_value_labels(&mut out, file)?;

    map[12] = out.position();
    out.tag("</stata_dta>");
    map[13] = out.position();

    for (index, offset) in map.iter().enumerate() {
        let at = map_at + index * 8;
        out.buf[at..at + 8].copy_from_slice(&encode_uint(*offset, 8, out.order));
    }
    Ok(out.buf)
}

fn write_header(out: &mut Output, file: &DtaFile) {
    let release = out.release;
    out.tag("<header>");
    out.tag("<release>");
    out.tag(&release.number().to_string());
    out.tag("</release>");
    out.tag("<byteorder>");
    out.tag(out.order.tag());
    out.tag("</byteorder>");
    out.tag("<K>");
    out.uint(file.variables.len() as u64, release.variable_count_width());
    out.tag("</K>");
    out.tag("<N>");
    out.uint(file.num_rows() as u64, release.observation_count_width());
    out.tag("</N>");

    out.tag("<label>");
    let label = file.header.label.as_deref().unwrap_or_default();
    let mut bytes = encode_text(label, release.variable_label_len(), release);
    bytes.truncate(bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len()));
    out.uint(bytes.len() as u64, release.label_len_width());
    out.buf.extend(bytes);
    out.tag("</label>");

    out.tag("<timestamp>");
    match file.header.timestamp.as_deref() {
        Some(timestamp) => {
            let mut bytes = encode_str(timestamp, release);
            bytes.truncate(TIMESTAMP_LEN);
            out.uint(bytes.len() as u64, 1);
            out.buf.extend(bytes);
        }
        None => out.uint(0, 1),
    }
    out.tag("</timestamp>");
    out.tag("</header>");
}

/// Write every cell; returns the long strings to store in `<strls>`.
fn write_rows<'a>(out: &mut Output, file: &'a DtaFile) -> Result<Vec<(u64, u64, &'a str)>> {
    let mut strls = Vec::new();
    for (row_index, row) in file.rows.iter().enumerate() {
        for (column, (variable, value)) in file.variables.iter().zip(row).enumerate() {
            match (variable.storage, value) {
                (StorageType::Str(width), DtaValue::Text(text)) => {
                    let width = usize::from(width);
                    if encode_str(text, out.release).len() > width {
                        return Err(DtaError::invalid_value(
                            &variable.name,
                            format!("text '{text}' is longer than {width} bytes"),
                        ));
                    }
                    let mut bytes = encode_text(text, width + 1, out.release);
                    bytes.truncate(width);
                    out.buf.extend(bytes);
                }
                (StorageType::StrL, DtaValue::Text(text)) => {
                    let key = if text.is_empty() {
                        (0, 0)
                    } else {
                        (column as u64 + 1, row_index as u64 + 1)
                    };
                    write_strl_key(out, key);
                    if !text.is_empty() {
                        strls.push((key.0, key.1, text.as_str()));
                    }
                }
                (storage, value) => {
                    let bytes = encode_number(value, storage, out.order)
                        .ok_or_else(|| cannot_store(variable, value))?;
                    out.buf.extend(bytes);
                }
            }
        }
    }
    Ok(strls)
}

/// Release 117 writes two 4-byte fields; later releases pack a 2-byte
/// variable ahead of a 6-byte observation.
fn write_strl_key(out: &mut Output, (variable, observation): (u64, u64)) {
    if out.release == Release::R117 {
        out.uint(variable, 4);
        out.uint(observation, 4);
        return;
    }
    let packed = match out.order {
        ByteOrder::Little => variable | (observation << 16),
        ByteOrder::Big => (variable << 48) | observation,
    };
    out.uint(packed, 8);
}

fn cannot_store(variable: &DtaVariable, value: &DtaValue) -> DtaError {
    DtaError::invalid_value(
        &variable.name,
        format!("{value:?} cannot be stored as {:?}", variable.storage),
    )
}

fn write_value_labels(out: &mut Output, file: &DtaFile) -> Result<()> {
    let release = out.release;
    out.tag("<value_labels>");
    for set in &file.label_sets {
        let mut offsets = Vec::with_capacity(set.entries.len());
        let mut keys = Vec::with_capacity(set.entries.len());
        let mut text = Vec::new();
        for (value, label) in &set.entries {
            let key = encode_label_key(value).ok_or_else(|| {
                DtaError::invalid_value(&set.name, format!("{value:?} is not a value label key"))
            })?;
            keys.push(key);
            offsets.push(text.len() as u64);
            text.extend(encode_str(label, release));
            text.push(0);
        }
        let table_len = 8 + 8 * set.entries.len() + text.len();

        out.tag("<lbl>");
        out.uint(table_len as u64, 4);
        out.text(&set.name, release.name_len());
        out.buf.extend([0u8; 3]);
        out.uint(set.entries.len() as u64, 4);
        out.uint(text.len() as u64, 4);
        for offset in offsets {
            out.uint(offset, 4);
        }
        for key in keys {
            out.uint(u64::from(key.cast_unsigned()), 4);
        }
        out.buf.extend(text);
        out.tag("</lbl>");
    }
    out.tag("</value_labels>");
    Ok(())
}

fn validate_file(file: &DtaFile) -> Result<()> {
    let release = file.header.release;
    let max_variables: u64 = if release == Release::R119 {
        u64::from(u32::MAX)
    } else {
        32_767
    };
    if file.variables.len() as u64 > max_variables {
        return Err(DtaError::invalid_format(format!(
            "{} variables exceed the release {} limit of {max_variables}",
            file.variables.len(),
            release.number()
        )));
    }
    if release == Release::R117 && u32::try_from(file.num_rows()).is_err() {
        return Err(DtaError::invalid_format(
            "release 117 holds at most 4294967295 observations",
        ));
    }
    let mut seen = HashSet::new();
    for variable in &file.variables {
        if variable.name.is_empty() {
            return Err(DtaError::invalid_format("empty variable name"));
        }
        if !seen.insert(variable.name.as_str()) {
            return Err(DtaError::invalid_value(
                &variable.name,
                "duplicate variable name",
            ));
        }
        if let StorageType::Str(width) = variable.storage
            && !(1..=StorageType::MAX_STR_WIDTH).contains(&width)
        {
            return Err(DtaError::invalid_value(
                &variable.name,
                format!("string width {width} outside 1..=2045"),
            ));
        }
    }
    let expected = file.variables.len();
    for row in &file.rows {
        if row.len() != expected {
            return Err(DtaError::RowLengthMismatch {
                expected,
                actual: row.len(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LabelSet;

    fn sample() -> DtaFile {
        let mut file = DtaFile::with_variables(vec![
            DtaVariable::new("id", StorageType::Long),
            DtaVariable::new("note", StorageType::StrL),
        ])
        .with_label_set(LabelSet::new("yesno").with_label(DtaValue::number(1.0), "Yes"));
        file.add_row(vec![DtaValue::number(1.0), DtaValue::text("first")]);
        file
    }

    #[test]
    fn map_points_at_each_section() {
        for order in [ByteOrder::Little, ByteOrder::Big] {
            let mut file = sample();
            file.header.byte_order = order;
            let buf = encode_file(&file).unwrap();
            let map_at = buf
                .windows(5)
                .position(|window| window == b"<map>")
                .unwrap()
                + 5;
            let offset = |index: usize| {
                let field: [u8; 8] = buf[map_at + index * 8..map_at + index * 8 + 8]
                    .try_into()
                    .unwrap();
                let value = match order {
                    ByteOrder::Little => u64::from_le_bytes(field),
                    ByteOrder::Big => u64::from_be_bytes(field),
                };
                usize::try_from(value).unwrap()
            };
            for (index, tag) in [
                (1, "<map>"),
                (2, "<variable_types>"),
                (5, "<formats>"),
                (9, "<data>"),
                (10, "<strls>"),
                (11, "<value_labels>"),
                (12, "</stata_dta>"),
            ] {
                assert!(buf[offset(index)..].starts_with(tag.as_bytes()), "{tag}");
            }
            assert_eq!(offset(13), buf.len());
        }
    }

    #[test]
    fn strl_key_layout() {
        let mut out = Output {
            buf: Vec::new(),
            release: Release::R118,
            order: ByteOrder::Big,
        };
        write_strl_key(&mut out, (2, 256));
        assert_eq!(out.buf, [0, 2, 0, 0, 0, 0, 1, 0]);
    }

    #[test]
    fn invalid_files_are_rejected() {
        let mut file = sample();
        file.add_row(vec![DtaValue::number(2.0)]);
        assert!(matches!(
            validate_file(&file),
            Err(DtaError::RowLengthMismatch {
                expected: 2,
                actual: 1
            })
        ));

        let mut file = sample();
        file.variables[1].name = "id".to_string();
        assert!(matches!(
            validate_file(&file),
            Err(DtaError::InvalidValue { variable, .. }) if variable == "id"
        ));
    }

    #[test]
    fn values_must_fit_their_storage() {
        let mut file = DtaFile::with_variables(vec![DtaVariable::new("code", StorageType::Str(2))]);
        file.add_row(vec![DtaValue::text("abc")]);
        assert!(matches!(encode_file(&file), Err(DtaError::InvalidValue { .. })));

        let mut file = DtaFile::with_variables(vec![DtaVariable::new("age", StorageType::Byte)]);
        file.add_row(vec![DtaValue::number(300.0)]);
        assert!(matches!(encode_file(&file), Err(DtaError::InvalidValue { .. })));

        let file = DtaFile::default()
            .with_label_set(LabelSet::new("bad").with_label(DtaValue::number(0.5), "Half"));
        assert!(matches!(encode_file(&file), Err(DtaError::InvalidValue { .. })));
    }
}
