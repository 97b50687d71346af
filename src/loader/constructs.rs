//! Construct Checks
//!
//! Document-level checks run before any semantic work: preprocessing
//! directives, the declared `cwlVersion`, and the shape of `run` references.

use serde_yaml::{Mapping, Value};

use crate::error::{DummyError, Result};

/// Preprocessing keys that would need a full schema-salad resolver.
pub const REJECTED_KEYS: &[&str] = &["$graph", "$import", "$include", "$mixin", "$base"];

pub const SUPPORTED_VERSIONS: &[&str] = &["v1.0", "v1.1", "v1.2"];

/// Scans the whole tree for [`REJECTED_KEYS`].
pub fn reject_preprocessing(node: &Value) -> Result<()> {
    scan(node, &mut Vec::new())
}

fn scan(node: &Value, trail: &mut Vec<String>) -> Result<()> {
    match node {
        Value::Mapping(mapping) => {
            for (key, value) in mapping {
                let name = key.as_str().unwrap_or_default();
                if REJECTED_KEYS.contains(&name) {
                    let location = if trail.is_empty() {
                        "document root".to_string()
                    } else {
                        trail.join(".")
                    };
                    return Err(DummyError::unsupported_construct(format!("{} (at {})", name, location)));
                }
                trail.push(name.to_string());
                scan(value, trail)?;
                trail.pop();
            }
            Ok(())
        }
        Value::Sequence(items) => {
            for (index, item) in items.iter().enumerate() {
                trail.push(format!("[{}]", index));
                scan(item, trail)?;
                trail.pop();
            }
            Ok(())
        }
        Value::Tagged(tagged) => scan(&tagged.value, trail),
        _ => Ok(()),
    }
}

/// Requires a supported `cwlVersion` on a top-level document.
pub fn check_version(node: &Mapping) -> Result<()> {
    match node.get("cwlVersion") {
        Some(Value::String(version)) if SUPPORTED_VERSIONS.contains(&version.as_str()) => Ok(()),
        Some(Value::String(version)) => Err(DummyError::UnsupportedVersion {
            version: version.clone(),
        }),
        Some(other) => Err(DummyError::UnsupportedVersion {
            version: format!("{:?}", other),
        }),
        None => Err(DummyError::UnsupportedVersion {
            version: "(none)".to_string(),
        }),
    }
}

/// Accepts plain relative or absolute paths only.
pub fn check_run_reference(reference: &str) -> Result<()> {
    if reference.contains("://") || reference.contains('#') {
        return Err(DummyError::unsupported_construct(format!(
            "relative identifier resolution in run reference '{}'",
            reference
        )));
    }
    if reference.trim().is_empty() {
        return Err(DummyError::Malformed("empty run reference".to_string()));
    }
    Ok(())
}
