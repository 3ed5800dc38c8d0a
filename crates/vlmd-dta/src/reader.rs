//! DTA file reader.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::cursor::{DtaCursor, decode_text, label_key};
use crate::error::{DtaError, Result};
use crate::types::{
    ByteOrder, DtaFile, DtaHeader, DtaValue, DtaVariable, LabelSet, Release, StorageType,
};

/// Entries in the `<map>` section.
pub(crate) const MAP_ENTRIES: usize = 14;
/// `GSO` type byte of a binary long string.
const STRL_BINARY: u8 = 129;

/// Stata data file reader for releases 117 to 119.
pub struct DtaReader<R: Read> {
    reader: BufReader<R>,
}

impl<R: Read> DtaReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
        }
    }

    /// Read the whole file into memory and parse it.
    pub fn read_file(mut self) -> Result<DtaFile> {
        let mut data = Vec::new();
        self.reader.read_to_end(&mut data)?;
        parse_dta_data(&data)
    }
}

impl DtaReader<File> {
    /// Open a data file for reading.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                DtaError::FileNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                DtaError::Io(e)
            }
        })?;
        Ok(Self::new(file))
    }
}

/// Read a data file from a path.
pub fn read_dta(path: &Path) -> Result<DtaFile> {
    DtaReader::open(path)?.read_file()
}

/// Parse a data file held in memory.
pub fn parse_dta_data(data: &[u8]) -> Result<DtaFile> {
    let mut cursor = DtaCursor::new(data);
    if !cursor.at_tag("<stata_dta>") {
        // Releases before 117 start with a single release byte.
        return Err(match data.first() {
            Some(&release) if (102..=116).contains(&release) => DtaError::UnsupportedRelease {
                release: release.to_string(),
            },
            _ => DtaError::invalid_format("missing <stata_dta> opening tag"),
        });
    }
    cursor.expect_tag("<stata_dta>")?;
    let (header, variable_count, observation_count) = parse_header(&mut cursor)?;
    let release = header.release;

    cursor.expect_tag("<map>")?;
    cursor.skip(MAP_ENTRIES * 8)?;
    cursor.expect_tag("</map>")?;

    let mut variables = parse_descriptors(&mut cursor, release, variable_count)?;

    cursor.expect_tag("<characteristics>")?;
    while cursor.at_tag("<ch>") {
        cursor.expect_tag("<ch>")?;
        let len = cursor.read_count(4, "characteristic length")?;
        cursor.skip(len)?;
        cursor.expect_tag("</ch>")?;
    }
    cursor.expect_tag("</characteristics>")?;

    cursor.expect_tag("<data>")?;
    let (mut rows, strl_cells) = parse_rows(&mut cursor, release, &variables, observation_count)?;
    cursor.expect_tag("</data>")?;

    cursor.expect_tag("<strls>")?;
    let strls = parse_strls(&mut cursor, release)?;
    cursor.expect_tag("</strls>")?;
    for StrlCell { row, column, key } in strl_cells {
        let text = if key == (0, 0) {
            String::new()
        } else {
            strls.get(&key).cloned().ok_or_else(|| {
                DtaError::invalid_format(format!(
                    "long string ({}, {}) of variable {} is not in <strls>",
                    key.0, key.1, variables[column].name
                ))
            })?
        };
        rows[row][column] = DtaValue::Text(text);
    }

    cursor.expect_tag("<value_labels>")?;
    let mut label_sets = Vec::new();
    while cursor.at_tag("<lbl>") {
        label_sets.push(parse_label_set(&mut cursor, release)?);
    }
    cursor.expect_tag("</value_labels>")?;
    cursor.expect_tag("</stata_dta>")?;

    // Attachments to sets that are not defined carry no labels.
    for variable in &mut variables {
        if variable
            .value_label_set
            .as_deref()
            .is_some_and(|name| label_sets.iter().all(|set: &LabelSet| set.name != name))
        {
            variable.value_label_set = None;
        }
    }

    Ok(DtaFile {
        header,
        variables,
        label_sets,
        rows,
    })
}

fn parse_header(cursor: &mut DtaCursor<'_>) -> Result<(DtaHeader, usize, usize)> {
    cursor.expect_tag("<header>")?;

    cursor.expect_tag("<release>")?;
    let digits = cursor.take(3)?;
    let number = std::str::from_utf8(digits)
        .ok()
        .and_then(|text| text.parse::<u16>().ok());
    let release = number.and_then(Release::from_number).ok_or_else(|| {
        DtaError::UnsupportedRelease {
            release: String::from_utf8_lossy(digits).into_owned(),
        }
    })?;
    cursor.expect_tag("</release>")?;

    cursor.expect_tag("<byteorder>")?;
    let tag = cursor.take(3)?;
    let byte_order = ByteOrder::from_tag(tag).ok_or_else(|| {
        DtaError::invalid_format(format!(
            "unknown byte order {}",
            String::from_utf8_lossy(tag)
        ))
    })?;
    cursor.set_order(byte_order);
    cursor.expect_tag("</byteorder>")?;

    cursor.expect_tag("<K>")?;
    let variable_count = cursor.read_count(release.variable_count_width(), "variable count")?;
    cursor.expect_tag("</K>")?;
    cursor.expect_tag("<N>")?;
    let observation_count =
        cursor.read_count(release.observation_count_width(), "observation count")?;
    cursor.expect_tag("</N>")?;

    cursor.expect_tag("<label>")?;
    let len = cursor.read_count(release.label_len_width(), "label length")?;
    let label = cursor.read_text(len, release)?;
    cursor.expect_tag("</label>")?;

    cursor.expect_tag("<timestamp>")?;
    let len = cursor.read_count(1, "timestamp length")?;
    let timestamp = cursor.read_text(len, release)?;
    cursor.expect_tag("</timestamp>")?;
    cursor.expect_tag("</header>")?;

    let header = DtaHeader {
        release,
        byte_order,
        label: non_empty(label),
        timestamp: non_empty(timestamp),
    };
    Ok((header, variable_count, observation_count))
}

fn non_empty(text: String) -> Option<String> {
    let trimmed = text.trim_end();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Types, names, formats, label attachments and labels of every variable.
fn parse_descriptors(
    cursor: &mut DtaCursor<'_>,
    release: Release,
    count: usize,
) -> Result<Vec<DtaVariable>> {
    cursor.expect_tag("<variable_types>")?;
    let mut storages = Vec::new();
    for _ in 0..count {
        let offset = cursor.position();
        let code = cursor.read_u16()?;
        let storage = StorageType::from_code(code).ok_or_else(|| {
            DtaError::invalid_format(format!("unknown storage type {code} at offset {offset}"))
        })?;
        storages.push(storage);
    }
    cursor.expect_tag("</variable_types>")?;

    let names = text_section(cursor, "varnames", count, release.name_len(), release)?;

    cursor.expect_tag("<sortlist>")?;
    cursor.skip(count.saturating_add(1).saturating_mul(release.sortlist_entry_width()))?;
    cursor.expect_tag("</sortlist>")?;

    let formats = text_section(cursor, "formats", count, release.format_len(), release)?;
    let sets = text_section(
        cursor,
        "value_label_names",
        count,
        release.name_len(),
        release,
    )?;
    let labels = text_section(
        cursor,
        "variable_labels",
        count,
        release.variable_label_len(),
        release,
    )?;

    let variables = storages
        .into_iter()
        .zip(names)
        .zip(formats)
        .zip(sets)
        .zip(labels)
        .map(|((((storage, name), format), set), label)| DtaVariable {
            name,
            storage,
            format,
            label: non_empty(label),
            value_label_set: non_empty(set),
        })
        .collect();
    Ok(variables)
}

fn text_section(
    cursor: &mut DtaCursor<'_>,
    tag: &str,
    count: usize,
    len: usize,
    release: Release,
) -> Result<Vec<String>> {
    cursor.expect_tag(&format!("<{tag}>"))?;
    let texts = (0..count)
        .map(|_| cursor.read_text(len, release))
        .collect::<Result<Vec<_>>>()?;
    cursor.expect_tag(&format!("</{tag}>"))?;
    Ok(texts)
}

/// Position of a long string cell, resolved once `<strls>` is read.
struct StrlCell {
    row: usize,
    column: usize,
    key: (u64, u64),
}

fn parse_rows(
    cursor: &mut DtaCursor<'_>,
    release: Release,
    variables: &[DtaVariable],
    count: usize,
) -> Result<(Vec<Vec<DtaValue>>, Vec<StrlCell>)> {
    let mut rows = Vec::new();
    let mut strl_cells = Vec::new();
    for row in 0..count {
        let mut values = Vec::with_capacity(variables.len());
        for (column, variable) in variables.iter().enumerate() {
            let value = match variable.storage {
                StorageType::Str(width) => {
                    DtaValue::Text(cursor.read_text(usize::from(width), release)?)
                }
                StorageType::StrL => {
                    let key = read_strl_key(cursor, release)?;
                    strl_cells.push(StrlCell { row, column, key });
                    DtaValue::Text(String::new())
                }
                storage => cursor.read_number(storage)?,
            };
            values.push(value);
        }
        rows.push(values);
    }
    Ok((rows, strl_cells))
}

/// `(variable, observation)` reference stored in a long string cell.
///
/// Release 117 stores two 4-byte fields; later releases pack a 2-byte
/// variable and a 6-byte observation into 8 bytes.
fn read_strl_key(cursor: &mut DtaCursor<'_>, release: Release) -> Result<(u64, u64)> {
    if release == Release::R117 {
        return Ok((u64::from(cursor.read_u32()?), u64::from(cursor.read_u32()?)));
    }
    let bytes = cursor.take(8)?;
    let (variable, observation) = bytes.split_at(2);
    Ok(match cursor.order() {
        ByteOrder::Big => (
            fold_bytes(variable.iter().copied()),
            fold_bytes(observation.iter().copied()),
        ),
        ByteOrder::Little => (
            fold_bytes(variable.iter().rev().copied()),
            fold_bytes(observation.iter().rev().copied()),
        ),
    })
}

/// Most significant byte first.
fn fold_bytes(bytes: impl Iterator<Item = u8>) -> u64 {
    bytes.fold(0, |acc, byte| (acc << 8) | u64::from(byte))
}

fn parse_strls(
    cursor: &mut DtaCursor<'_>,
    release: Release,
) -> Result<HashMap<(u64, u64), String>> {
    let mut strls = HashMap::new();
    while cursor.at_tag("GSO") {
        cursor.expect_tag("GSO")?;
        let variable = u64::from(cursor.read_u32()?);
        let observation = cursor.read_uint(release.strl_observation_width())?;
        let kind = cursor.read_u8()?;
        let len = cursor.read_count(4, "long string length")?;
        let bytes = cursor.take(len)?;
        let text = if kind == STRL_BINARY {
            String::from_utf8_lossy(bytes).into_owned()
        } else {
            decode_text(bytes, release)
        };
        strls.insert((variable, observation), text);
    }
    Ok(strls)
}

fn parse_label_set(cursor: &mut DtaCursor<'_>, release: Release) -> Result<LabelSet> {
    cursor.expect_tag("<lbl>")?;
    let table_len = cursor.read_count(4, "value label table length")?;
    let name = cursor.read_text(release.name_len(), release)?;
    cursor.skip(3)?;
    let start = cursor.position();

    let entry_count = cursor.read_count(4, "value label count")?;
    let text_len = cursor.read_count(4, "value label text length")?;
    let offsets = (0..entry_count)
        .map(|_| cursor.read_count(4, "value label offset"))
        .collect::<Result<Vec<_>>>()?;
    let keys = (0..entry_count)
        .map(|_| cursor.read_i32())
        .collect::<Result<Vec<_>>>()?;
    let text = cursor.take(text_len)?;

    let mut set = LabelSet::new(name);
    for (offset, key) in offsets.into_iter().zip(keys) {
        let label = text.get(offset..).ok_or_else(|| {
            DtaError::invalid_format(format!(
                "value label offset {offset} outside table {}",
                set.name
            ))
        })?;
        set.entries.push((label_key(key), decode_text(label, release)));
    }

    if cursor.position() - start != table_len {
        return Err(DtaError::invalid_format(format!(
            "value label table {} declares {table_len} bytes but holds {}",
            set.name,
            cursor.position() - start
        )));
    }
    cursor.expect_tag("</lbl>")?;
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn old_releases_are_reported() {
        let mut data = vec![114u8, 2, 1, 0];
        data.resize(109, 0);
        assert!(matches!(
            parse_dta_data(&data),
            Err(DtaError::UnsupportedRelease { release }) if release == "114"
        ));
    }

    #[test]
    fn unknown_tagged_release_is_reported() {
        let data = b"<stata_dta><header><release>120</release>";
        assert!(matches!(
            parse_dta_data(data),
            Err(DtaError::UnsupportedRelease { release }) if release == "120"
        ));
    }

    #[test]
    fn garbage_is_invalid() {
        assert!(matches!(
            parse_dta_data(b"PK\x03\x04"),
            Err(DtaError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn strl_keys_in_both_orders() {
        let little = [2, 0, 5, 0, 0, 0, 0, 0];
        let mut cursor = DtaCursor::new(&little);
        assert_eq!(read_strl_key(&mut cursor, Release::R118).unwrap(), (2, 5));

        let big = [0, 2, 0, 0, 0, 0, 1, 0];
        let mut cursor = DtaCursor::new(&big);
        cursor.set_order(ByteOrder::Big);
        assert_eq!(read_strl_key(&mut cursor, Release::R118).unwrap(), (2, 256));
    }
}
