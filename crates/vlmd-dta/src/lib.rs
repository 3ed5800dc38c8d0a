//! Stata data file (`.dta`) reader and writer.
//!
//! Handles the tagged format of Stata 13 and later (releases 117, 118 and
//! 119) in either byte order: variable names, storage types, display
//! formats, variable labels, value label sets, fixed and long strings, and
//! the `.` and `.a` to `.z` missing codes. The writer is mainly used to
//! build fixtures.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use vlmd_dta::{DtaFile, DtaValue, DtaVariable, LabelSet, StorageType, read_dta, write_dta};
//!
//! let mut file = DtaFile::with_variables(vec![
//!     DtaVariable::new("smoker", StorageType::Byte)
//!         .with_label("Current smoker")
//!         .with_value_labels("yesno"),
//! ])
//! .with_label_set(
//!     LabelSet::new("yesno")
//!         .with_label(DtaValue::number(1.0), "Yes")
//!         .with_label(DtaValue::extended_missing('a'), "Refused"),
//! );
//! file.add_row(vec![DtaValue::extended_missing('a')]);
//! write_dta(Path::new("survey.dta"), &file).unwrap();
//!
//! let read_back = read_dta(Path::new("survey.dta")).unwrap();
//! assert_eq!(read_back.num_rows(), 1);
//! ```

mod cursor;
pub mod datetime;
mod error;
mod reader;
mod types;
mod writer;

pub use error::{DtaError, Result};

pub use types::{
    ByteOrder, DtaFile, DtaHeader, DtaValue, DtaVariable, LabelSet, MissingCode, Release,
    StorageType, TemporalKind,
};

pub use reader::{DtaReader, parse_dta_data, read_dta};

pub use writer::{DtaWriter, write_dta};
