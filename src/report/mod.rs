//! Run Reporting
//!
//! Per-document outcomes and warnings collected during a conversion run.

pub mod conversion;

pub use conversion::{ConversionReport, DocumentOutcome, Outcome, Warning};
