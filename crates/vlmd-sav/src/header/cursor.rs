//! Bounds-checked reading of fixed-size fields.

use crate::error::{Result, SavError};
use crate::types::Endian;

/// Forward-only reader over an in-memory system file.
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
    endian: Endian,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8], endian: Endian) -> Self {
        Self {
            data,
            pos: 0,
            endian,
        }
    }

    /// Cursor positioned at `pos`.
    pub fn at(data: &'a [u8], pos: usize, endian: Endian) -> Self {
        Self { data, pos, endian }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn endian(&self) -> Endian {
        self.endian
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Take the next `len` bytes.
    pub fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let truncated = SavError::Truncated { offset: self.pos };
        let end = self.pos.checked_add(len).ok_or(truncated)?;
        let slice = self
            .data
            .get(self.pos..end)
            .ok_or(SavError::Truncated { offset: self.pos })?;
        self.pos = end;
        Ok(slice)
    }

    pub fn skip(&mut self, len: usize) -> Result<()> {
        self.take(len).map(|_| ())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_array4(&mut self) -> Result<[u8; 4]> {
        let offset = self.pos;
        self.take(4)?
            .try_into()
            .map_err(|_| SavError::Truncated { offset })
    }

    pub fn read_array8(&mut self) -> Result<[u8; 8]> {
        let offset = self.pos;
        self.take(8)?
            .try_into()
            .map_err(|_| SavError::Truncated { offset })
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(decode_i32(self.read_array4()?, self.endian))
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        Ok(decode_f64(self.read_array8()?, self.endian))
    }

    /// Read a count field that must not be negative.
    pub fn read_count(&mut self, what: &str) -> Result<usize> {
        let offset = self.pos;
        let value = self.read_i32()?;
        usize::try_from(value).map_err(|_| {
            SavError::invalid_format(format!("negative {what} ({value}) at offset {offset}"))
        })
    }
}

pub fn decode_i32(bytes: [u8; 4], endian: Endian) -> i32 {
    match endian {
        Endian::Little => i32::from_le_bytes(bytes),
        Endian::Big => i32::from_be_bytes(bytes),
    }
}

pub fn decode_f64(bytes: [u8; 8], endian: Endian) -> f64 {
    match endian {
        Endian::Little => f64::from_le_bytes(bytes),
        Endian::Big => f64::from_be_bytes(bytes),
    }
}

/// Decode a space-padded text field, dropping trailing spaces and NULs.
pub fn decode_text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .trim_end_matches([' ', '\0'])
        .to_string()
}

/// Encode text into exactly `len` bytes, space padded.
pub fn encode_text(text: &str, len: usize) -> Vec<u8> {
    let mut bytes: Vec<u8> = text.bytes().take(len).collect();
    bytes.resize(len, b' ');
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_in_both_byte_orders() {
        let data = [0, 0, 0, 2, 2, 0, 0, 0];
        let mut big = ByteCursor::new(&data, Endian::Big);
        assert_eq!(big.read_i32().unwrap(), 2);
        let mut little = ByteCursor::at(&data, 4, Endian::Little);
        assert_eq!(little.read_i32().unwrap(), 2);
        assert_eq!(little.remaining(), 0);
    }

    #[test]
    fn take_past_end_is_truncation() {
        let data = [1, 2, 3];
        let mut cursor = ByteCursor::new(&data, Endian::Little);
        assert!(matches!(
            cursor.read_i32(),
            Err(SavError::Truncated { offset: 0 })
        ));
    }

    #[test]
    fn text_padding() {
        assert_eq!(decode_text(b"AGE     "), "AGE");
        assert_eq!(decode_text(b"ab\0\0"), "ab");
        assert_eq!(encode_text("AGE", 8), b"AGE     ".to_vec());
        assert_eq!(encode_text("ABCDEFGHIJ", 8), b"ABCDEFGH".to_vec());
    }

    #[test]
    fn negative_count_is_rejected() {
        let data = (-1i32).to_le_bytes();
        let mut cursor = ByteCursor::new(&data, Endian::Little);
        assert!(matches!(
            cursor.read_count("label count"),
            Err(SavError::InvalidFormat { .. })
        ));
    }
}
