//! Trivial Expression Matching
//!
//! The converter never evaluates JavaScript. It only recognises two narrow
//! shapes and rejects everything else:
//!
//! - a whole-string reference to one input, e.g. `$(inputs.sample)`, used in
//!   output globs;
//! - a literal return, e.g. `$("abc")` or `${ return 42; }`, used in
//!   `outputEval`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_yaml::Value;

use crate::error::{DummyError, Result};

/// Any CWL parameter reference: `$(name.seg['key']["key"][0])`.
static PARAMETER_REFERENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\$\(\w+(?:\.\w+|\['[^']*'\]|\["[^"]*"\]|\[\d+\])*\)"#)
        .expect("parameter reference pattern is valid")
});

/// A whole-string reference rooted at one named input.
static INPUT_REFERENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^\$\(inputs(?:\.(\w+)|\['([^']*)'\]|\["([^"]*)"\])((?:\.\w+|\['[^']*'\]|\["[^"]*"\]|\[\d+\])*)\)$"#,
    )
    .expect("input reference pattern is valid")
});

/// `${ return <literal>; }`
static LITERAL_RETURN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^\$\{\s*return\s+(.+?)\s*;?\s*\}$").expect("literal return pattern is valid")
});

/// Removes every parameter reference from `text`.
pub fn strip_references(text: &str) -> String {
    PARAMETER_REFERENCE.replace_all(text, "").into_owned()
}

/// A reference to a single input value, e.g. `$(inputs.bam.basename)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputReference {
    /// Id of the referenced input.
    pub input: String,
    /// Anything after the input id (`.basename`, `[0]`, ...), possibly empty.
    pub path: String,
}

/// Parses `text` as exactly one input reference and nothing else.
pub fn parse_input_reference(text: &str) -> Option<InputReference> {
    let captures = INPUT_REFERENCE.captures(text.trim())?;
    let input = captures
        .get(1)
        .or_else(|| captures.get(2))
        .or_else(|| captures.get(3))?
        .as_str()
        .to_string();
    let path = captures.get(4).map(|m| m.as_str().to_string()).unwrap_or_default();
    Some(InputReference { input, path })
}

/// What an output glob resolves to at run time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GlobSource {
    /// A fixed path.
    Literal(String),
    /// The runtime value of one input.
    Input(InputReference),
}

/// Accepts a glob that is either literal or a single input reference.
pub fn classify_glob(glob: &str, input_ids: &[&str]) -> Result<GlobSource> {
    if !glob.contains('$') {
        return Ok(GlobSource::Literal(glob.to_string()));
    }
    if glob.contains("${") {
        return Err(DummyError::unsupported_expression(
            glob,
            "JavaScript function bodies are not evaluated",
        ));
    }
    if glob.matches('$').count() > 1 {
        return Err(DummyError::unsupported_expression(
            glob,
            "multiple parameter references in one field",
        ));
    }

    match parse_input_reference(glob) {
        Some(reference) if input_ids.contains(&reference.input.as_str()) => Ok(GlobSource::Input(reference)),
        Some(reference) => Err(DummyError::unsupported_expression(
            glob,
            format!("references unknown input '{}'", reference.input),
        )),
        None if !strip_references(glob.trim()).is_empty() => Err(DummyError::unsupported_expression(
            glob,
            "leading or trailing characters around a parameter reference",
        )),
        None => Err(DummyError::unsupported_expression(
            glob,
            "only references to inputs can be substituted",
        )),
    }
}

/// Extracts the literal an `outputEval` returns, rejecting anything that
/// would need evaluation.
pub fn trivial_literal(expression: &Value) -> Result<serde_json::Value> {
    let text = match expression {
        Value::String(text) => text,
        Value::Tagged(_) => {
            return Err(DummyError::unsupported_expression(
                format!("{:?}", expression),
                "tagged values are not literals",
            ))
        }
        other => {
            return serde_json::to_value(other)
                .map_err(|e| DummyError::unsupported_expression(format!("{:?}", other), e.to_string()))
        }
    };

    let trimmed = text.trim();
    if !trimmed.contains('$') {
        return Ok(serde_json::Value::String(text.clone()));
    }

    let body = trimmed
        .strip_prefix("$(")
        .and_then(|rest| rest.strip_suffix(')'))
        .or_else(|| {
            LITERAL_RETURN
                .captures(trimmed)
                .and_then(|captures| captures.get(1))
                .map(|m| m.as_str())
        });

    body.and_then(|literal| serde_json::from_str(literal.trim()).ok())
        .ok_or_else(|| DummyError::unsupported_expression(text.as_str(), "not a single literal return"))
}

/// Renders a literal as a CWL expression returning it.
pub fn literal_expression(literal: &serde_json::Value) -> String {
    format!("$({})", literal)
}
