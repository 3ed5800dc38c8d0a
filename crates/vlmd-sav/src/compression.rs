//! Case element streams.
//!
//! Case data is a sequence of 8-byte elements. Bytecode compression packs
//! them into blocks of eight one-byte command codes, each followed by the raw
//! elements its codes call for:
//!
//! | Code    | Meaning                                         |
//! |---------|-------------------------------------------------|
//! | 0       | Padding, ignored                                |
//! | 1-251   | Numeric value `code - bias`                     |
//! | 252     | End of data                                     |
//! | 253     | Raw 8-byte element follows the command block    |
//! | 254     | Eight spaces (string segment)                   |
//! | 255     | System-missing                                  |

use crate::error::Result;
use crate::header::ByteCursor;

const CODE_PADDING: u8 = 0;
const CODE_EOF: u8 = 252;
const CODE_RAW: u8 = 253;
const CODE_SPACES: u8 = 254;
const CODE_SYSMIS: u8 = 255;

/// One decoded case element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Element {
    Raw([u8; 8]),
    Number(f64),
    Spaces,
    SysMis,
}

/// Source of case elements; `None` means the data ended.
pub trait ElementSource {
    fn next_element(&mut self) -> Result<Option<Element>>;
}

/// Uncompressed elements read straight from the file.
pub struct RawElements<'c, 'a> {
    cursor: &'c mut ByteCursor<'a>,
}

impl<'c, 'a> RawElements<'c, 'a> {
    pub fn new(cursor: &'c mut ByteCursor<'a>) -> Self {
        Self { cursor }
    }
}

impl ElementSource for RawElements<'_, '_> {
    fn next_element(&mut self) -> Result<Option<Element>> {
        if self.cursor.remaining() < 8 {
            return Ok(None);
        }
        Ok(Some(Element::Raw(self.cursor.read_array8()?)))
    }
}

/// Bytecode-compressed elements.
pub struct BytecodeElements<'c, 'a> {
    cursor: &'c mut ByteCursor<'a>,
    bias: f64,
    codes: [u8; 8],
    next: usize,
    finished: bool,
}

impl<'c, 'a> BytecodeElements<'c, 'a> {
    pub fn new(cursor: &'c mut ByteCursor<'a>, bias: f64) -> Self {
        Self {
            cursor,
            bias,
            codes: [0; 8],
            next: 8,
            finished: false,
        }
    }
}

impl ElementSource for BytecodeElements<'_, '_> {
    fn next_element(&mut self) -> Result<Option<Element>> {
        loop {
            if self.finished {
                return Ok(None);
            }
            if self.next == self.codes.len() {
                if self.cursor.remaining() < 8 {
                    self.finished = true;
                    return Ok(None);
                }
                self.codes = self.cursor.read_array8()?;
                self.next = 0;
            }
            let code = self.codes[self.next];
            self.next += 1;
            match code {
                CODE_PADDING => {}
                CODE_EOF => self.finished = true,
                CODE_RAW => return Ok(Some(Element::Raw(self.cursor.read_array8()?))),
                CODE_SPACES => return Ok(Some(Element::Spaces)),
                CODE_SYSMIS => return Ok(Some(Element::SysMis)),
                value => return Ok(Some(Element::Number(f64::from(value) - self.bias))),
            }
        }
    }
}

/// Builds a bytecode-compressed case data stream.
pub struct BytecodeEncoder {
    bias: f64,
    codes: Vec<u8>,
    pending: Vec<u8>,
    out: Vec<u8>,
}

impl BytecodeEncoder {
    pub fn new(bias: f64) -> Self {
        Self {
            bias,
            codes: Vec::with_capacity(8),
            pending: Vec::new(),
            out: Vec::new(),
        }
    }

    /// Encode a numeric element; `None` is system-missing.
    pub fn push_number(&mut self, value: Option<f64>) {
        match value {
            None => self.push_code(CODE_SYSMIS),
            Some(value) if self.is_compressible(value) => {
                self.push_code((value + self.bias) as u8);
            }
            Some(value) => self.push_raw(value.to_le_bytes()),
        }
    }

    /// Encode one 8-byte string segment.
    pub fn push_segment(&mut self, segment: [u8; 8]) {
        if segment == [b' '; 8] {
            self.push_code(CODE_SPACES);
        } else {
            self.push_raw(segment);
        }
    }

    /// Terminate the stream and return its bytes.
    pub fn finish(mut self) -> Vec<u8> {
        if !self.codes.is_empty() {
            self.codes.push(CODE_EOF);
            self.flush();
        }
        self.out
    }

    fn is_compressible(&self, value: f64) -> bool {
        value.fract() == 0.0 && value >= 1.0 - self.bias && value <= 251.0 - self.bias
    }

    fn push_raw(&mut self, bytes: [u8; 8]) {
        self.pending.extend_from_slice(&bytes);
        self.push_code(CODE_RAW);
    }

    fn push_code(&mut self, code: u8) {
        self.codes.push(code);
        if self.codes.len() == 8 {
            self.flush();
        }
    }

    fn flush(&mut self) {
        self.codes.resize(8, CODE_PADDING);
        self.out.append(&mut self.codes);
        self.out.append(&mut self.pending);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Endian;

    fn decode_all(bytes: &[u8]) -> Vec<Element> {
        let mut cursor = ByteCursor::new(bytes, Endian::Little);
        let mut source = BytecodeElements::new(&mut cursor, 100.0);
        let mut elements = Vec::new();
        while let Some(element) = source.next_element().unwrap() {
            elements.push(element);
        }
        elements
    }

    #[test]
    fn small_integers_use_command_codes() {
        let mut encoder = BytecodeEncoder::new(100.0);
        encoder.push_number(Some(1.0));
        encoder.push_number(Some(-99.0));
        encoder.push_number(None);
        let bytes = encoder.finish();
        assert_eq!(bytes, vec![101, 1, 255, 252, 0, 0, 0, 0]);
        assert_eq!(
            decode_all(&bytes),
            vec![
                Element::Number(1.0),
                Element::Number(-99.0),
                Element::SysMis
            ]
        );
    }

    #[test]
    fn raw_values_follow_their_block() {
        let mut encoder = BytecodeEncoder::new(100.0);
        encoder.push_number(Some(2.5));
        encoder.push_segment(*b"        ");
        encoder.push_segment(*b"abc     ");
        let bytes = encoder.finish();
        assert_eq!(&bytes[..8], &[253, 254, 253, 252, 0, 0, 0, 0]);
        assert_eq!(bytes.len(), 24);
        assert_eq!(
            decode_all(&bytes),
            vec![
                Element::Raw(2.5f64.to_le_bytes()),
                Element::Spaces,
                Element::Raw(*b"abc     ")
            ]
        );
    }

    #[test]
    fn full_block_needs_no_terminator() {
        let mut encoder = BytecodeEncoder::new(100.0);
        for value in 0..8 {
            encoder.push_number(Some(f64::from(value)));
        }
        let bytes = encoder.finish();
        assert_eq!(bytes.len(), 8);
        assert_eq!(decode_all(&bytes).len(), 8);
    }
}
