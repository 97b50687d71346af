//! cwl-dummy - CWL Dummy Generator
//!
//! Converts CWL tools and workflows into *dummies*: documents with the same
//! interface and wiring whose tools do no real work. Running a dummy
//! workflow only creates the files and directories each step declares, so
//! the structure of a pipeline can be exercised in seconds.
//!
//! # Architecture
//!
//! - [`schema`]: Typed CWL model and the closed type algebra
//! - [`loader`]: Reading documents and the per-run document cache
//! - [`synth`]: Placeholder values and trivial expression matching
//! - [`transform`]: Tool and workflow rewriting, the fabrication driver
//! - [`emit`]: Naming and atomically writing converted documents
//! - [`convert`]: The depth-first conversion driver and its options
//! - [`report`]: Per-document outcomes and warnings
//!
//! # Example
//!
//! ```rust,no_run
//! use cwl_dummy::{ConvertOptions, Converter};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut converter = Converter::new(ConvertOptions::default());
//!
//!     // Writes pipeline.cwl.dummy and a dummy for every referenced tool
//!     let dummy = converter.convert("pipeline.cwl")?;
//!     println!("{}", dummy.display());
//!
//!     for warning in converter.report().get_warnings() {
//!         println!("{}: {}", warning.document, warning.message);
//!     }
//!     Ok(())
//! }
//! ```

pub mod convert;
pub mod emit;
pub mod error;
pub mod loader;
pub mod report;
pub mod schema;
pub mod synth;
pub mod transform;

// Re-export commonly used types
pub use convert::{ConvertOptions, Converter};
pub use error::{DummyError, Result};
pub use report::{ConversionReport, Outcome};
pub use schema::{CommandLineTool, CwlType, Process, Workflow};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "cwl-dummy";
