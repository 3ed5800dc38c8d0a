//! Field inference and normalization for data dictionaries.
//!
//! Turns a [`SourceTable`] (case data plus declared variable metadata) into a
//! canonical [`vlmd_model::DataDictionary`], and renders that dictionary into
//! its tabular and nested views.

pub mod encoding;
pub mod error;
pub mod infer;
pub mod missing;
pub mod normalize;
pub mod values;
pub mod views;

pub use encoding::resolve_enum;
pub use error::{ResolveError, ViewError};
pub use infer::infer_field_type;
pub use missing::resolve_missing_values;
pub use normalize::{
    MetadataBundle, SourceTable, VariableMetadata, normalize_dictionary, normalize_field,
};
pub use values::RawValue;
pub use views::{DictionaryViews, TabularView, build_views, nested_fields, nested_view};
