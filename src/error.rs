//! Error Types
//!
//! Every fatal condition the converter can hit maps to one [`DummyError`]
//! variant. Context (document path, step id, parameter id) is layered on
//! with [`DummyError::context`] so messages can locate the offending
//! declaration, and [`DummyError::root_cause`] recovers the underlying kind.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DummyError>;

/// Errors produced while loading, transforming or emitting documents.
#[derive(Debug, Error)]
pub enum DummyError {
    #[error("failed to access '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse '{}': {source}", path.display())]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("malformed document: {0}")]
    Malformed(String),

    /// A type tag outside the closed type algebra.
    #[error("unrecognized type '{tag}'")]
    Schema { tag: String },

    /// A preprocessing or language feature this tool declines to handle.
    #[error("unsupported construct: {construct}")]
    UnsupportedConstruct { construct: String },

    #[error("unsupported cwlVersion '{version}' (supported: v1.0, v1.1, v1.2)")]
    UnsupportedVersion { version: String },

    #[error("cyclic reference: {}", chain.join(" -> "))]
    CyclicReference { chain: Vec<String> },

    /// An expression that is more than a literal or a single input reference.
    #[error("unsupported expression {expression:?}: {reason}")]
    UnsupportedExpression { expression: String, reason: String },

    #[error("'{}' already failed to convert", path.display())]
    PreviouslyFailed { path: PathBuf },

    #[error("{failed} step(s) failed to convert")]
    StepsFailed { failed: usize },

    #[error("{context}: {source}")]
    Context {
        context: String,
        source: Box<DummyError>,
    },
}

impl DummyError {
    pub fn unsupported_construct(construct: impl Into<String>) -> Self {
        Self::UnsupportedConstruct {
            construct: construct.into(),
        }
    }

    pub fn unsupported_expression(expression: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnsupportedExpression {
            expression: expression.into(),
            reason: reason.into(),
        }
    }

    pub fn schema(tag: impl Into<String>) -> Self {
        Self::Schema { tag: tag.into() }
    }

    /// Wraps this error with a location prefix.
    pub fn context(self, context: impl Into<String>) -> Self {
        Self::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Returns the innermost error, skipping any context layers.
    pub fn root_cause(&self) -> &DummyError {
        let mut current = self;
        while let Self::Context { source, .. } = current {
            current = source;
        }
        current
    }
}
