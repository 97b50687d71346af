//! Document Loader
//!
//! Turns references (file paths or embedded step processes) into parsed
//! [`Process`](crate::schema::Process) values, visiting each file at most
//! once per run.
//!
//! # Structure
//!
//! - [`cache`]: Visited documents and their conversion state
//! - [`constructs`]: Preprocessing, version and reference checks
//! - [`document`]: Reading, parsing and the `load` entry point

pub mod cache;
pub mod constructs;
pub mod document;

pub use cache::{Artifact, DocId, DocumentCache, DocumentKey, EntryState};
pub use document::{load, parse_file, resolve_run_path, Document, DocumentRef, Loaded};
