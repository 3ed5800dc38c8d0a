//! Canonical data dictionary model.
//!
//! Every source format is converted into a [`DataDictionary`] of [`Field`]s;
//! validators describe problems with [`ValidationReport`]s.

pub mod dictionary;
pub mod field;
pub mod report;
pub mod scalar;

pub use dictionary::{DataDictionary, DictionaryProps};
pub use field::{Constraints, Encodings, Field, FieldType};
pub use report::{ErrorCode, ErrorLocation, ValidationError, ValidationReport};
pub use scalar::{Scalar, push_unique};
