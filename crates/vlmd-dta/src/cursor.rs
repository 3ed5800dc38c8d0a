//! Bounds-checked field access and the numeric missing-value encoding.

use crate::error::{DtaError, Result};
use crate::types::{ByteOrder, DtaValue, MissingCode, Release, StorageType};

/// Largest valid value of each integer storage type; missing codes follow.
const BYTE_MAX: i64 = 100;
const INT_MAX: i64 = 32_740;
const LONG_MAX: i64 = 2_147_483_620;
/// Bit patterns of `.` for the floating types; `.a` onwards add one step.
const FLOAT_MISSING: u32 = 0x7f00_0000;
const FLOAT_STEP: u32 = 0x0000_0800;
const DOUBLE_MISSING: u64 = 0x7fe0_0000_0000_0000;
const DOUBLE_STEP: u64 = 0x0000_0100_0000_0000;

/// Forward-only reader over an in-memory data file.
pub struct DtaCursor<'a> {
    data: &'a [u8],
    pos: usize,
    order: ByteOrder,
}

impl<'a> DtaCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            order: ByteOrder::default(),
        }
    }

    pub fn set_order(&mut self, order: ByteOrder) {
        self.order = order;
    }

    pub fn order(&self) -> ByteOrder {
        self.order
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let truncated = DtaError::Truncated { offset: self.pos };
        let end = self.pos.checked_add(len).ok_or(truncated)?;
        let slice = self
            .data
            .get(self.pos..end)
            .ok_or(DtaError::Truncated { offset: self.pos })?;
        self.pos = end;
        Ok(slice)
    }

    pub fn skip(&mut self, len: usize) -> Result<()> {
        self.take(len).map(|_| ())
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let offset = self.pos;
        self.take(N)?
            .try_into()
            .map_err(|_| DtaError::Truncated { offset })
    }

    /// True when the next bytes are `tag`; consumes nothing.
    pub fn at_tag(&self, tag: &str) -> bool {
        self.data
            .get(self.pos..)
            .is_some_and(|rest| rest.starts_with(tag.as_bytes()))
    }

    pub fn expect_tag(&mut self, tag: &str) -> Result<()> {
        let offset = self.pos;
        let found = self.take(tag.len())?;
        if found == tag.as_bytes() {
            Ok(())
        } else {
            Err(DtaError::invalid_format(format!(
                "expected {tag} at offset {offset}"
            )))
        }
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let bytes = self.array()?;
        Ok(match self.order {
            ByteOrder::Little => u16::from_le_bytes(bytes),
            ByteOrder::Big => u16::from_be_bytes(bytes),
        })
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let bytes = self.array()?;
        Ok(match self.order {
            ByteOrder::Little => u32::from_le_bytes(bytes),
            ByteOrder::Big => u32::from_be_bytes(bytes),
        })
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        let bytes = self.array()?;
        Ok(match self.order {
            ByteOrder::Little => u64::from_le_bytes(bytes),
            ByteOrder::Big => u64::from_be_bytes(bytes),
        })
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(self.read_u32()?.cast_signed())
    }

    /// Unsigned field of `width` bytes (1, 2, 4 or 8).
    pub fn read_uint(&mut self, width: usize) -> Result<u64> {
        match width {
            1 => self.read_u8().map(u64::from),
            2 => self.read_u16().map(u64::from),
            4 => self.read_u32().map(u64::from),
            _ => self.read_u64(),
        }
    }

    /// Unsigned count field of `width` bytes, as `usize`.
    pub fn read_count(&mut self, width: usize, what: &str) -> Result<usize> {
        let offset = self.pos;
        let value = self.read_uint(width)?;
        usize::try_from(value).map_err(|_| {
            DtaError::invalid_format(format!("{what} {value} at offset {offset} is too large"))
        })
    }

    /// One numeric cell of the given storage type.
    pub fn read_number(&mut self, storage: StorageType) -> Result<DtaValue> {
        Ok(match storage {
            StorageType::Byte => integer_value(i64::from(self.read_u8()?.cast_signed()), BYTE_MAX),
            StorageType::Int => integer_value(i64::from(self.read_u16()?.cast_signed()), INT_MAX),
            StorageType::Long => integer_value(i64::from(self.read_i32()?), LONG_MAX),
            StorageType::Float => float_value(self.read_u32()?),
            StorageType::Double => double_value(self.read_u64()?),
            StorageType::Str(_) | StorageType::StrL => {
                return Err(DtaError::invalid_format("string storage read as a number"));
            }
        })
    }

    /// Fixed-width, NUL-terminated text field.
    pub fn read_text(&mut self, len: usize, release: Release) -> Result<String> {
        Ok(decode_text(self.take(len)?, release))
    }
}

fn integer_value(raw: i64, max: i64) -> DtaValue {
    if raw <= max {
        return DtaValue::Number(raw as f64);
    }
    let offset = u64::try_from(raw - max - 1).unwrap_or(u64::MAX);
    DtaValue::Missing(MissingCode::from_offset(offset).unwrap_or(MissingCode::System))
}

fn float_value(bits: u32) -> DtaValue {
    let value = f32::from_bits(bits);
    if value.is_sign_negative() || bits < FLOAT_MISSING {
        return DtaValue::Number(f64::from(value));
    }
    let offset = u64::from((bits - FLOAT_MISSING) / FLOAT_STEP);
    DtaValue::Missing(MissingCode::from_offset(offset).unwrap_or(MissingCode::System))
}

fn double_value(bits: u64) -> DtaValue {
    let value = f64::from_bits(bits);
    if value.is_sign_negative() || bits < DOUBLE_MISSING {
        return DtaValue::Number(value);
    }
    let offset = (bits - DOUBLE_MISSING) / DOUBLE_STEP;
    DtaValue::Missing(MissingCode::from_offset(offset).unwrap_or(MissingCode::System))
}

/// Value label keys are always stored as `long`.
pub fn label_key(raw: i32) -> DtaValue {
    integer_value(i64::from(raw), LONG_MAX)
}

/// Encoded `long` for a value label key.
pub fn encode_label_key(value: &DtaValue) -> Option<i32> {
    match value {
        DtaValue::Number(number) => exact_integer(*number, i64::from(i32::MIN), LONG_MAX)
            .and_then(|n| i32::try_from(n).ok()),
        DtaValue::Missing(code) => i32::try_from(LONG_MAX + 1 + i64::from(code.offset())).ok(),
        DtaValue::Text(_) => None,
    }
}

fn exact_integer(value: f64, min: i64, max: i64) -> Option<i64> {
    let in_range = value.fract() == 0.0 && value >= min as f64 && value <= max as f64;
    in_range.then_some(value as i64)
}

/// Raw bytes of one numeric cell, or `None` if the value does not fit.
pub fn encode_number(value: &DtaValue, storage: StorageType, order: ByteOrder) -> Option<Vec<u8>> {
    let bits: u64 = match (storage, value) {
        (StorageType::Byte, DtaValue::Number(n)) => {
            u64::from(i8::try_from(exact_integer(*n, -127, BYTE_MAX)?).ok()?.cast_unsigned())
        }
        (StorageType::Byte, DtaValue::Missing(code)) => (BYTE_MAX as u64) + 1 + u64::from(code.offset()),
        (StorageType::Int, DtaValue::Number(n)) => {
            u64::from(i16::try_from(exact_integer(*n, -32_767, INT_MAX)?).ok()?.cast_unsigned())
        }
        (StorageType::Int, DtaValue::Missing(code)) => (INT_MAX as u64) + 1 + u64::from(code.offset()),
        (StorageType::Long, DtaValue::Number(n)) => u64::from(
            i32::try_from(exact_integer(*n, -2_147_483_647, LONG_MAX)?)
                .ok()?
                .cast_unsigned(),
        ),
        (StorageType::Long, DtaValue::Missing(code)) => {
            (LONG_MAX as u64) + 1 + u64::from(code.offset())
        }
        (StorageType::Float, DtaValue::Number(n)) => {
            let narrowed = *n as f32;
            let bits = narrowed.to_bits();
            (narrowed.is_finite() && (bits < FLOAT_MISSING || narrowed < 0.0))
                .then_some(u64::from(bits))?
        }
        (StorageType::Float, DtaValue::Missing(code)) => {
            u64::from(FLOAT_MISSING + u32::from(code.offset()) * FLOAT_STEP)
        }
        (StorageType::Double, DtaValue::Number(n)) => {
            (n.is_finite() && (n.to_bits() < DOUBLE_MISSING || *n < 0.0)).then_some(n.to_bits())?
        }
        (StorageType::Double, DtaValue::Missing(code)) => {
            DOUBLE_MISSING + u64::from(code.offset()) * DOUBLE_STEP
        }
        _ => return None,
    };
    let width = storage.width();
    Some(encode_uint(bits, width, order))
}

/// The low `width` bytes of `value` in file byte order.
pub fn encode_uint(value: u64, width: usize, order: ByteOrder) -> Vec<u8> {
    let bytes = value.to_le_bytes();
    let mut field = bytes[..width].to_vec();
    if order == ByteOrder::Big {
        field.reverse();
    }
    field
}

/// Decode a NUL-terminated field: UTF-8 from release 118, Latin-1 before.
pub fn decode_text(bytes: &[u8], release: Release) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    let bytes = &bytes[..end];
    if release.is_utf8() {
        String::from_utf8_lossy(bytes).into_owned()
    } else {
        bytes.iter().map(|&b| char::from(b)).collect()
    }
}

/// Encode text into exactly `len` bytes with at least one trailing NUL.
///
/// Latin-1 fields replace characters above U+00FF with `?`. UTF-8 fields
/// are cut on a character boundary.
pub fn encode_text(text: &str, len: usize, release: Release) -> Vec<u8> {
    let mut bytes = encode_str(text, release);
    let mut cut = len.saturating_sub(1).min(bytes.len());
    while release.is_utf8() && cut > 0 && !text.is_char_boundary(cut) {
        cut -= 1;
    }
    bytes.truncate(cut);
    bytes.resize(len, 0);
    bytes
}

/// Unpadded text bytes in the release's encoding.
pub fn encode_str(text: &str, release: Release) -> Vec<u8> {
    if release.is_utf8() {
        text.as_bytes().to_vec()
    } else {
        text.chars()
            .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(bytes: &[u8], storage: StorageType, order: ByteOrder) -> DtaValue {
        let mut cursor = DtaCursor::new(bytes);
        cursor.set_order(order);
        cursor.read_number(storage).unwrap()
    }

    #[test]
    fn integer_missing_codes() {
        assert_eq!(read(&[100], StorageType::Byte, ByteOrder::Little), DtaValue::Number(100.0));
        assert_eq!(read(&[0x81], StorageType::Byte, ByteOrder::Little), DtaValue::Number(-127.0));
        assert_eq!(read(&[101], StorageType::Byte, ByteOrder::Little), DtaValue::missing());
        assert_eq!(read(&[102], StorageType::Byte, ByteOrder::Little), DtaValue::extended_missing('a'));
        assert_eq!(read(&[127], StorageType::Byte, ByteOrder::Little), DtaValue::extended_missing('z'));
        assert_eq!(
            read(&32_742u16.to_be_bytes(), StorageType::Int, ByteOrder::Big),
            DtaValue::extended_missing('a')
        );
        assert_eq!(
            read(&2_147_483_623i32.to_le_bytes(), StorageType::Long, ByteOrder::Little),
            DtaValue::extended_missing('b')
        );
    }

    #[test]
    fn floating_missing_codes() {
        let dot = 0x7fe0_0000_0000_0000u64.to_le_bytes();
        assert_eq!(read(&dot, StorageType::Double, ByteOrder::Little), DtaValue::missing());
        let c = 0x7fe0_0300_0000_0000u64.to_le_bytes();
        assert_eq!(read(&c, StorageType::Double, ByteOrder::Little), DtaValue::extended_missing('c'));
        let big = (-1.0e300f64).to_le_bytes();
        assert_eq!(read(&big, StorageType::Double, ByteOrder::Little), DtaValue::Number(-1.0e300));
        let a = 0x7f00_0800u32.to_be_bytes();
        assert_eq!(read(&a, StorageType::Float, ByteOrder::Big), DtaValue::extended_missing('a'));
        let half = 0.5f32.to_le_bytes();
        assert_eq!(read(&half, StorageType::Float, ByteOrder::Little), DtaValue::Number(0.5));
    }

    #[test]
    fn encoding_matches_decoding() {
        for storage in [
            StorageType::Byte,
            StorageType::Int,
            StorageType::Long,
            StorageType::Float,
            StorageType::Double,
        ] {
            for value in [
                DtaValue::number(-5.0),
                DtaValue::number(42.0),
                DtaValue::missing(),
                DtaValue::extended_missing('a'),
                DtaValue::extended_missing('z'),
            ] {
                let bytes = encode_number(&value, storage, ByteOrder::Big).unwrap();
                assert_eq!(bytes.len(), storage.width());
                assert_eq!(read(&bytes, storage, ByteOrder::Big), value, "{storage:?}");
            }
        }
    }

    #[test]
    fn values_outside_the_storage_range_do_not_encode() {
        let order = ByteOrder::Little;
        assert!(encode_number(&DtaValue::number(101.0), StorageType::Byte, order).is_none());
        assert!(encode_number(&DtaValue::number(1.5), StorageType::Int, order).is_none());
        assert!(encode_number(&DtaValue::number(f64::MAX), StorageType::Double, order).is_none());
        assert!(encode_number(&DtaValue::text("x"), StorageType::Long, order).is_none());
    }

    #[test]
    fn label_keys_use_long_codes() {
        assert_eq!(label_key(-9), DtaValue::Number(-9.0));
        assert_eq!(label_key(2_147_483_622), DtaValue::extended_missing('a'));
        assert_eq!(encode_label_key(&DtaValue::extended_missing('a')), Some(2_147_483_622));
        assert_eq!(encode_label_key(&DtaValue::number(2.5)), None);
    }

    #[test]
    fn text_fields() {
        assert_eq!(decode_text(b"age\0junk", Release::R118), "age");
        assert_eq!(decode_text(&[b'J', 0xf6, b'n', 0], Release::R117), "Jön");
        assert_eq!(encode_text("Jön", 5, Release::R117), vec![b'J', 0xf6, b'n', 0, 0]);
        assert_eq!(encode_text("Jön", 4, Release::R118), vec![b'J', 0xc3, 0xb6, 0]);
        assert_eq!(encode_text("Jön", 3, Release::R118), vec![b'J', 0, 0]);
    }

    #[test]
    fn tags() {
        let mut cursor = DtaCursor::new(b"<K>..");
        assert!(cursor.at_tag("<K>"));
        assert!(cursor.expect_tag("<N>").is_err());
        assert!(matches!(
            DtaCursor::new(b"<K").expect_tag("<K>"),
            Err(DtaError::Truncated { offset: 0 })
        ));
    }
}
