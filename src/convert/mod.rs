//! Conversion
//!
//! - [`Converter`]: depth-first conversion of a document tree
//! - [`ConvertOptions`]: run settings

pub mod converter;
pub mod options;

pub use converter::Converter;
pub use options::ConvertOptions;
