//! Schema Model
//!
//! Typed representation of CWL documents: the closed type algebra and the
//! process classes with their parameters and step graph.
//!
//! # Structure
//!
//! - [`types`]: The `CwlType` sum type and its parser
//! - [`model`]: Tools, workflows, steps and parameters
//! - [`forms`]: Map form to list form normalisation

pub mod forms;
pub mod model;
pub mod types;

pub use model::{
    CommandLineTool, InputBinding, OutputBinding, Parameter, Process, RunReference, Step, Workflow,
};
pub use types::{CwlType, RecordField, ScalarKind};
