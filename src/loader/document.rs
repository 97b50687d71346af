//! Document Loading
//!
//! Reads a CWL document from disk (or takes an embedded one from a step),
//! registers it in the [`DocumentCache`] and parses it into a [`Process`].

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde_yaml::{Mapping, Value};

use super::cache::{Artifact, DocId, DocumentCache, DocumentKey, EntryState};
use super::constructs::{check_run_reference, check_version, reject_preprocessing};
use crate::error::{DummyError, Result};
use crate::schema::Process;

/// A document to load.
#[derive(Debug, Clone)]
pub enum DocumentRef<'a> {
    /// A file on disk.
    Path(&'a Path),
    /// A process embedded in a step, with its synthetic key.
    Inline { key: String, node: Mapping },
}

/// A document reached for the first time.
#[derive(Debug, Clone)]
pub struct Document {
    pub key: DocumentKey,
    pub process: Process,
}

/// Outcome of [`load`].
#[derive(Debug, Clone)]
pub enum Loaded {
    /// Parsed now; the caller must `complete` or `fail` the entry.
    Fresh { id: DocId, document: Document },
    /// Converted earlier in this run.
    Cached { id: DocId, artifact: Artifact },
}

/// Loads a document, consulting and updating `cache`.
///
/// A placeholder entry is inserted before parsing. If parsing fails the
/// entry is marked failed before the error is returned.
///
/// # Example
///
/// ```rust,no_run
/// use std::path::Path;
/// use cwl_dummy::loader::{load, DocumentCache, DocumentRef, Loaded};
///
/// let mut cache = DocumentCache::new();
/// if let Loaded::Fresh { document, .. } = load(&mut cache, DocumentRef::Path(Path::new("sort.cwl")))? {
///     println!("{}", document.process.class());
/// }
/// # Ok::<(), cwl_dummy::DummyError>(())
/// ```
pub fn load(cache: &mut DocumentCache, reference: DocumentRef<'_>) -> Result<Loaded> {
    match reference {
        DocumentRef::Path(path) => load_path(cache, path),
        DocumentRef::Inline { key, node } => {
            let key = DocumentKey::Inline(key);
            if let Some(loaded) = check_cache(cache, &key, Path::new(""))? {
                return Ok(loaded);
            }
            let id = cache.begin(key.clone());
            match Process::from_node(node) {
                Ok(process) => Ok(Loaded::Fresh {
                    id,
                    document: Document { key, process },
                }),
                Err(e) => {
                    cache.fail(id);
                    Err(e)
                }
            }
        }
    }
}

fn load_path(cache: &mut DocumentCache, path: &Path) -> Result<Loaded> {
    let canonical = fs::canonicalize(path).map_err(|source| DummyError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let key = DocumentKey::Path(canonical.clone());

    if let Some(loaded) = check_cache(cache, &key, path)? {
        return Ok(loaded);
    }

    let id = cache.begin(key.clone());
    match parse_file(&canonical) {
        Ok(process) => {
            info!("Loaded {} ({})", path.display(), process.class());
            Ok(Loaded::Fresh {
                id,
                document: Document { key, process },
            })
        }
        Err(e) => {
            cache.fail(id);
            Err(e)
        }
    }
}

fn check_cache(cache: &DocumentCache, key: &DocumentKey, path: &Path) -> Result<Option<Loaded>> {
    let Some((id, state)) = cache.lookup(key) else {
        return Ok(None);
    };
    match state {
        EntryState::Converted(artifact) => {
            debug!("Cache hit for {}", key);
            Ok(Some(Loaded::Cached {
                id,
                artifact: artifact.clone(),
            }))
        }
        EntryState::InProgress => {
            let mut chain: Vec<String> = cache
                .in_progress_chain()
                .into_iter()
                .skip_while(|k| *k != key)
                .map(ToString::to_string)
                .collect();
            chain.push(key.to_string());
            Err(DummyError::CyclicReference { chain })
        }
        EntryState::Failed => Err(DummyError::PreviouslyFailed {
            path: path.to_path_buf(),
        }),
    }
}

/// Reads, scans and parses one document file.
pub fn parse_file(path: &Path) -> Result<Process> {
    let content = fs::read_to_string(path).map_err(|source| DummyError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("Read {} ({} bytes)", path.display(), content.len());

    let node: Value = serde_yaml::from_str(&content).map_err(|source| DummyError::Yaml {
        path: path.to_path_buf(),
        source,
    })?;
    reject_preprocessing(&node)?;

    let Value::Mapping(mapping) = node else {
        return Err(DummyError::Malformed("document root is not a mapping".to_string()));
    };
    check_version(&mapping)?;
    Process::from_node(mapping)
}

/// Resolves a step's `run` path against the directory of the referencing
/// document.
pub fn resolve_run_path(base_dir: &Path, reference: &str) -> Result<PathBuf> {
    check_run_reference(reference)?;
    Ok(base_dir.join(reference))
}
