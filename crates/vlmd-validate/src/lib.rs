//! Schema validation of the two data dictionary views.
//!
//! Both validators report content problems as data: they never fail, and
//! return the fields that passed alongside a [`vlmd_model::ValidationReport`].

mod rules;

pub mod nested;
pub mod tabular;

pub use nested::validate_nested;
pub use tabular::validate_tabular;
