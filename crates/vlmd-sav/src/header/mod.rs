//! System file header and dictionary records.
//!
//! A `.sav` file is laid out as:
//! - the 176-byte file header
//! - dictionary records (variables, value labels, documents, extensions)
//! - the dictionary terminator (record type 999)
//! - case data, raw or bytecode-compressed

pub mod cursor;
pub mod dictionary;
pub mod file;

pub use cursor::{ByteCursor, decode_f64, decode_i32, decode_text, encode_text};
pub use dictionary::{
    Dictionary, RECORD_DOCUMENT, RECORD_EXTENSION, RECORD_TERMINATOR, RECORD_VALUE_LABELS,
    RECORD_VALUE_LABEL_VARS, RECORD_VARIABLE, SUBTYPE_ENCODING, SUBTYPE_FLOAT_INFO,
    SUBTYPE_LONG_NAMES, parse_dictionary,
};
pub use file::{HEADER_LEN, MAGIC, ZSAV_MAGIC, build_file_header, parse_file_header};
