//! SAV file reader.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::compression::{BytecodeElements, Element, ElementSource, RawElements};
use crate::error::{Result, SavError};
use crate::header::{ByteCursor, decode_f64, decode_text, parse_dictionary, parse_file_header};
use crate::types::{Compression, Endian, FloatInfo, SavFile, SavValue, VarType};

/// SPSS system file reader.
///
/// Reads little- and big-endian files, uncompressed or bytecode-compressed.
pub struct SavReader<R: Read> {
    reader: BufReader<R>,
}

impl<R: Read> SavReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
        }
    }

    /// Read the whole file into memory and parse it.
    pub fn read_file(mut self) -> Result<SavFile> {
        let mut data = Vec::new();
        self.reader.read_to_end(&mut data)?;
        parse_sav_data(&data)
    }
}

impl SavReader<File> {
    /// Open a system file for reading.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SavError::FileNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                SavError::Io(e)
            }
        })?;
        Ok(Self::new(file))
    }
}

/// Read a system file from a path.
pub fn read_sav(path: &Path) -> Result<SavFile> {
    SavReader::open(path)?.read_file()
}

/// Parse a system file held in memory.
pub fn parse_sav_data(data: &[u8]) -> Result<SavFile> {
    let (header, mut cursor) = parse_file_header(data)?;
    let dictionary = parse_dictionary(&mut cursor)?;
    let layout = dictionary.layout();
    let decoder = CaseDecoder {
        endian: header.endian,
        float_info: dictionary.float_info,
    };

    let rows = match header.compression {
        Compression::None => {
            let mut source = RawElements::new(&mut cursor);
            decoder.read_cases(&mut source, &layout, header.case_count)?
        }
        Compression::Bytecode => {
            let mut source = BytecodeElements::new(&mut cursor, header.bias);
            decoder.read_cases(&mut source, &layout, header.case_count)?
        }
    };

    Ok(SavFile {
        header,
        variables: dictionary.variables,
        encoding: dictionary.encoding,
        float_info: dictionary.float_info,
        rows,
    })
}

struct CaseDecoder {
    endian: Endian,
    float_info: FloatInfo,
}

impl CaseDecoder {
    fn read_cases(
        &self,
        source: &mut impl ElementSource,
        layout: &[VarType],
        case_count: Option<usize>,
    ) -> Result<Vec<Vec<SavValue>>> {
        let mut rows = Vec::with_capacity(case_count.unwrap_or_default().min(1 << 16));
        if layout.is_empty() {
            return Ok(rows);
        }
        while case_count.is_none_or(|count| rows.len() < count) {
            match self.read_case(source, layout, rows.len())? {
                Some(row) => rows.push(row),
                None => break,
            }
        }
        Ok(rows)
    }

    /// Decode one case; `None` when the data ends cleanly before it starts.
    fn read_case(
        &self,
        source: &mut impl ElementSource,
        layout: &[VarType],
        case_index: usize,
    ) -> Result<Option<Vec<SavValue>>> {
        let mut row = Vec::with_capacity(layout.len());
        let mut first = true;
        for var_type in layout {
            let mut elements = Vec::with_capacity(var_type.segments());
            for _ in 0..var_type.segments() {
                match source.next_element()? {
                    Some(element) => elements.push(element),
                    None if first => return Ok(None),
                    None => {
                        return Err(SavError::invalid_format(format!(
                            "case {} ends part-way through",
                            case_index + 1
                        )));
                    }
                }
                first = false;
            }
            row.push(match var_type {
                VarType::Numeric => SavValue::Numeric(self.numeric(elements[0])),
                VarType::String { width } => SavValue::String(string_value(&elements, *width)),
            });
        }
        Ok(Some(row))
    }

    fn numeric(&self, element: Element) -> Option<f64> {
        match element {
            Element::Number(value) => Some(value),
            Element::Raw(bytes) => {
                let value = decode_f64(bytes, self.endian);
                (value != self.float_info.sysmis && !value.is_nan()).then_some(value)
            }
            Element::Spaces | Element::SysMis => None,
        }
    }
}

fn string_value(elements: &[Element], width: u16) -> String {
    let mut bytes = Vec::with_capacity(elements.len() * 8);
    for element in elements {
        match element {
            Element::Raw(raw) => bytes.extend_from_slice(raw),
            _ => bytes.extend_from_slice(&[b' '; 8]),
        }
    }
    bytes.truncate(usize::from(width));
    decode_text(&bytes)
}
