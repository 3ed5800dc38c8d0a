//! The 176-byte file header.
//!
//! | Offset  | Field             | Type     |
//! |---------|-------------------|----------|
//! | 0-3     | rec_type          | char[4]  |
//! | 4-63    | prod_name         | char[60] |
//! | 64-67   | layout_code       | int32    |
//! | 68-71   | nominal_case_size | int32    |
//! | 72-75   | compression       | int32    |
//! | 76-79   | weight_index      | int32    |
//! | 80-83   | ncases            | int32    |
//! | 84-91   | bias              | flt64    |
//! | 92-100  | creation_date     | char[9]  |
//! | 101-108 | creation_time     | char[8]  |
//! | 109-172 | file_label        | char[64] |
//! | 173-175 | padding           | char[3]  |

use crate::error::{Result, SavError};
use crate::header::cursor::{ByteCursor, decode_text, encode_text};
use crate::types::{Compression, Endian, FileHeader};

pub const HEADER_LEN: usize = 176;

/// Signature of an uncompressed or bytecode-compressed file.
pub const MAGIC: &[u8; 4] = b"$FL2";

/// Signature of a zlib-compressed (`.zsav`) file.
pub const ZSAV_MAGIC: &[u8; 4] = b"$FL3";

const LAYOUT_OFFSET: usize = 64;

/// Parse the file header, detecting byte order from the layout code.
///
/// Returns the header and the cursor positioned at the first dictionary record.
pub fn parse_file_header(data: &[u8]) -> Result<(FileHeader, ByteCursor<'_>)> {
    if data.len() < HEADER_LEN {
        return Err(SavError::invalid_format(format!(
            "file too small: {} bytes",
            data.len()
        )));
    }
    match &data[0..4] {
        magic if magic == MAGIC => {}
        magic if magic == ZSAV_MAGIC => {
            return Err(SavError::UnsupportedCompression { code: 2 });
        }
        _ => return Err(SavError::invalid_format("missing $FL2 signature")),
    }

    let endian = detect_endian(&data[LAYOUT_OFFSET..LAYOUT_OFFSET + 4])?;
    let mut cursor = ByteCursor::at(data, LAYOUT_OFFSET + 4, endian);
    let _nominal_case_size = cursor.read_i32()?;
    let compression = Compression::from_code(cursor.read_i32()?)?;
    let _weight_index = cursor.read_i32()?;
    let ncases = cursor.read_i32()?;
    let bias = cursor.read_f64()?;
    let creation_date = decode_text(cursor.take(9)?);
    let creation_time = decode_text(cursor.take(8)?);
    let file_label = decode_text(cursor.take(64)?);
    cursor.skip(3)?;

    let header = FileHeader {
        product: decode_text(&data[4..64]),
        endian,
        compression,
        // -1 means the writer did not know the count.
        case_count: usize::try_from(ncases).ok(),
        bias,
        creation_date,
        creation_time,
        file_label: Some(file_label).filter(|label| !label.is_empty()),
    };
    Ok((header, cursor))
}

fn detect_endian(layout: &[u8]) -> Result<Endian> {
    match layout {
        [2 | 3, 0, 0, 0] => Ok(Endian::Little),
        [0, 0, 0, 2 | 3] => Ok(Endian::Big),
        _ => Err(SavError::invalid_format(format!(
            "unrecognized layout code {layout:?}"
        ))),
    }
}

/// Build a little-endian file header.
pub fn build_file_header(header: &FileHeader, case_size: usize, case_count: usize) -> Vec<u8> {
    let mut buf = Vec::with_capacity(HEADER_LEN);
    buf.extend_from_slice(MAGIC);
    buf.extend(encode_text(&header.product, 60));
    buf.extend_from_slice(&2i32.to_le_bytes());
    buf.extend_from_slice(&i32::try_from(case_size).unwrap_or(-1).to_le_bytes());
    buf.extend_from_slice(&header.compression.code().to_le_bytes());
    buf.extend_from_slice(&0i32.to_le_bytes());
    buf.extend_from_slice(&i32::try_from(case_count).unwrap_or(-1).to_le_bytes());
    buf.extend_from_slice(&header.bias.to_le_bytes());
    buf.extend(encode_text(&header.creation_date, 9));
    buf.extend(encode_text(&header.creation_time, 8));
    buf.extend(encode_text(header.file_label.as_deref().unwrap_or_default(), 64));
    buf.extend_from_slice(&[0u8; 3]);
    buf
}
