//! Document Cache
//!
//! Arena of every document visited during one conversion run. Each document
//! gets a placeholder entry before it is parsed, so a reference that leads
//! back to an entry still in progress is a cycle. Because conversion is
//! depth-first, the in-progress entries in insertion order are exactly the
//! current chain of references.

use std::fmt;
use std::path::{Path, PathBuf};

/// Index of an entry in the [`DocumentCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocId(usize);

/// Identity of a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DocumentKey {
    /// A file, by canonical path.
    Path(PathBuf),
    /// A process embedded in a step, keyed `<parent>#<step id>`.
    Inline(String),
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => write!(f, "{}", path.display()),
            Self::Inline(key) => write!(f, "{}", key),
        }
    }
}

/// What a finished conversion produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Artifact {
    /// The generated sibling file.
    File(PathBuf),
    /// The converted process was embedded back into its parent.
    Inline,
}

impl Artifact {
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::File(path) => Some(path),
            Self::Inline => None,
        }
    }
}

/// Lifecycle of a cache entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryState {
    InProgress,
    Converted(Artifact),
    Failed,
}

#[derive(Debug, Clone)]
struct Entry {
    key: DocumentKey,
    state: EntryState,
}

/// Visited documents, in the order they were first reached.
#[derive(Debug, Default)]
pub struct DocumentCache {
    entries: Vec<Entry>,
}

impl DocumentCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Finds the entry for `key`, if the document was reached before.
    pub fn lookup(&self, key: &DocumentKey) -> Option<(DocId, &EntryState)> {
        self.entries
            .iter()
            .position(|entry| &entry.key == key)
            .map(|index| (DocId(index), &self.entries[index].state))
    }

    /// Inserts an in-progress placeholder for a newly reached document.
    pub fn begin(&mut self, key: DocumentKey) -> DocId {
        self.entries.push(Entry {
            key,
            state: EntryState::InProgress,
        });
        DocId(self.entries.len() - 1)
    }

    /// Marks a document as converted.
    pub fn complete(&mut self, id: DocId, artifact: Artifact) {
        if let Some(entry) = self.entries.get_mut(id.0) {
            entry.state = EntryState::Converted(artifact);
        }
    }

    /// Marks a document as failed; later references fail fast.
    pub fn fail(&mut self, id: DocId) {
        if let Some(entry) = self.entries.get_mut(id.0) {
            entry.state = EntryState::Failed;
        }
    }

    pub fn key(&self, id: DocId) -> Option<&DocumentKey> {
        self.entries.get(id.0).map(|entry| &entry.key)
    }

    pub fn state(&self, id: DocId) -> Option<&EntryState> {
        self.entries.get(id.0).map(|entry| &entry.state)
    }

    /// Keys of every in-progress entry, outermost first.
    pub fn in_progress_chain(&self) -> Vec<&DocumentKey> {
        self.entries
            .iter()
            .filter(|entry| entry.state == EntryState::InProgress)
            .map(|entry| &entry.key)
            .collect()
    }

    /// Number of documents reached so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries in the given state.
    pub fn count(&self, matches: impl Fn(&EntryState) -> bool) -> usize {
        self.entries.iter().filter(|entry| matches(&entry.state)).count()
    }
}
