//! Input kinds and the adapters that turn each kind into a
//! [`vlmd_model::DataDictionary`].
//!
//! Dispatch is closed: every [`InputKind`] has exactly one adapter.
//!
//! ```no_run
//! use std::path::Path;
//! use vlmd_ingest::InputKind;
//! use vlmd_model::DictionaryProps;
//!
//! let path = Path::new("survey.sav");
//! let kind = InputKind::infer_from_path(path)?;
//! let dictionary = kind.extract(path, &DictionaryProps::new())?;
//! println!("{} fields", dictionary.fields().len());
//! # Ok::<(), vlmd_ingest::IngestError>(())
//! ```

pub mod adapter;
pub mod csv_table;
pub mod csv_template;
pub mod error;
pub mod json_template;
pub mod kind;
pub mod redcap;
pub mod stata;
pub mod statistical;

pub use adapter::SourceAdapter;
pub use csv_table::{CsvTable, read_csv_table};
pub use csv_template::CsvTemplateAdapter;
pub use error::IngestError;
pub use json_template::JsonTemplateAdapter;
pub use kind::{InputKind, default_title};
pub use redcap::RedcapAdapter;
pub use stata::{DtaAdapter, stata_source_table};
pub use statistical::{SavAdapter, source_table};
