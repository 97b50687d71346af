//! Output Emission
//!
//! Naming, rendering and atomically writing converted documents.

pub mod writer;

pub use writer::{output_path, relative_reference, render, EmitStatus, Emitted, Emitter, DEFAULT_SUFFIX};
