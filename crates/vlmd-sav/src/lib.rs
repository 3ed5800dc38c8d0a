//! SPSS system file (`.sav`) reader and writer.
//!
//! Reads the dictionary (variables, labels, formats, user-missing values,
//! value labels, long names) and the case data of uncompressed and
//! bytecode-compressed files in either byte order. The writer produces
//! little-endian files and is mainly used to build fixtures.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use vlmd_sav::{SavFile, SavValue, SavVariable, read_sav, write_sav};
//!
//! let mut file = SavFile::with_variables(vec![
//!     SavVariable::numeric("smoker")
//!         .with_label("Current smoker")
//!         .with_value_label(SavValue::numeric(1.0), "Yes")
//!         .with_value_label(SavValue::numeric(0.0), "No"),
//!     SavVariable::string("site", 8),
//! ]);
//! file.add_row(vec![SavValue::numeric(1.0), SavValue::string("north")]);
//! write_sav(Path::new("survey.sav"), &file).unwrap();
//!
//! let read_back = read_sav(Path::new("survey.sav")).unwrap();
//! assert_eq!(read_back.num_rows(), 1);
//! ```

pub mod compression;
pub mod datetime;
mod error;
pub mod header;
mod reader;
mod types;
mod writer;

pub use error::{Result, SavError};

pub use types::{
    Compression, Endian, FileHeader, FloatInfo, MissingValues, PrintFormat, SavFile, SavValue,
    SavVariable, TemporalKind, VarType, format_codes,
};

pub use reader::{SavReader, parse_sav_data, read_sav};

pub use writer::{SavWriter, SavWriterOptions, write_sav, write_sav_with_options};
