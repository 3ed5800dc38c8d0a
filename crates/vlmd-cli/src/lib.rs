//! Library side of the `vlmd` command: logging setup and the conversion
//! pipeline.

pub mod logging;
pub mod pipeline;

pub use pipeline::{ConversionResult, ConvertError, ConvertOptions, convert};
