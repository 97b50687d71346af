//! CWL Type Algebra
//!
//! A closed sum type covering the CWL types this tool can reason about.
//! Parsing is strict: any tag outside the set is rejected with
//! [`DummyError::Schema`] instead of being passed through.
//!
//! # Accepted forms
//!
//! ```yaml
//! type: string            # scalar
//! type: File[]?           # shorthand suffixes
//! type: [null, int]       # union with null -> optional
//! type:
//!   type: record
//!   fields:
//!     - name: size
//!       type: long
//! ```

use std::fmt;

use serde_yaml::{Mapping, Value};

use super::forms::{describe, ensure_sequence_form, shortname};
use crate::error::{DummyError, Result};

/// Primitive, non-file CWL types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    String,
    Int,
    Long,
    Float,
    Double,
    Boolean,
}

impl ScalarKind {
    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "string" => Some(Self::String),
            "int" => Some(Self::Int),
            "long" => Some(Self::Long),
            "float" => Some(Self::Float),
            "double" => Some(Self::Double),
            "boolean" => Some(Self::Boolean),
            _ => None,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Long => "long",
            Self::Float => "float",
            Self::Double => "double",
            Self::Boolean => "boolean",
        }
    }
}

/// A field of a record type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordField {
    pub name: String,
    pub field_type: CwlType,
}

/// A parsed CWL type.
///
/// Invariants: `Optional` never wraps another `Optional`, and a `Union`
/// holds at least two distinct, non-optional alternatives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CwlType {
    Scalar(ScalarKind),
    File,
    Directory,
    Enum { symbols: Vec<String> },
    Array(Box<CwlType>),
    Record { fields: Vec<RecordField> },
    Union(Vec<CwlType>),
    Optional(Box<CwlType>),
}

impl CwlType {
    /// Parses a raw `type` node.
    pub fn parse(node: &Value) -> Result<Self> {
        match node {
            Value::String(tag) => Self::parse_tag(tag),
            Value::Sequence(alternatives) => Self::parse_union(alternatives),
            Value::Mapping(mapping) => Self::parse_mapping(mapping),
            Value::Null => Err(DummyError::schema("<missing>")),
            other => Err(DummyError::schema(describe(other))),
        }
    }

    fn parse_tag(tag: &str) -> Result<Self> {
        let tag = tag.trim();
        if let Some(inner) = tag.strip_suffix('?') {
            return Ok(Self::optional(Self::parse_tag(inner)?));
        }
        if let Some(inner) = tag.strip_suffix("[]") {
            return Ok(Self::Array(Box::new(Self::parse_tag(inner)?)));
        }
        if let Some(kind) = ScalarKind::from_tag(tag) {
            return Ok(Self::Scalar(kind));
        }
        match tag {
            "File" => Ok(Self::File),
            "Directory" => Ok(Self::Directory),
            "stdout" | "stderr" => Err(DummyError::unsupported_construct(format!(
                "'{}' output type (stdin/stdout/stderr redirection)",
                tag
            ))),
            other => Err(DummyError::schema(other)),
        }
    }

    fn parse_union(alternatives: &[Value]) -> Result<Self> {
        let mut nullable = false;
        let mut members: Vec<CwlType> = Vec::new();

        for alternative in alternatives {
            if alternative.as_str() == Some("null") {
                nullable = true;
                continue;
            }
            let parsed = match Self::parse(alternative)? {
                Self::Optional(inner) => {
                    nullable = true;
                    *inner
                }
                other => other,
            };
            let flattened = match parsed {
                Self::Union(nested) => nested,
                single => vec![single],
            };
            for member in flattened {
                if !members.contains(&member) {
                    members.push(member);
                }
            }
        }

        let core = match members.len() {
            0 => return Err(DummyError::schema("null")),
            1 => members.remove(0),
            _ => Self::Union(members),
        };

        Ok(if nullable { Self::optional(core) } else { core })
    }

    fn parse_mapping(mapping: &Mapping) -> Result<Self> {
        let tag = match mapping.get("type") {
            Some(Value::String(tag)) => tag.as_str(),
            Some(other) => return Err(DummyError::schema(format!("type: {}", describe(other)))),
            None => return Err(DummyError::schema("<mapping without type>")),
        };

        match tag {
            "array" => {
                let items = mapping
                    .get("items")
                    .ok_or_else(|| DummyError::Malformed("array type without items".to_string()))?;
                Ok(Self::Array(Box::new(Self::parse(items)?)))
            }
            "record" => {
                let fields = mapping.get("fields").cloned().unwrap_or(Value::Null);
                let entries = ensure_sequence_form(fields, "name", "type")
                    .map_err(|e| DummyError::Malformed(format!("record fields: {}", e)))?;
                let fields = entries
                    .iter()
                    .map(|entry| {
                        let name = entry
                            .get("name")
                            .and_then(Value::as_str)
                            .ok_or_else(|| DummyError::Malformed("record field without name".to_string()))?;
                        let field_type = Self::parse(entry.get("type").unwrap_or(&Value::Null))
                            .map_err(|e| e.context(format!("record field '{}'", name)))?;
                        Ok(RecordField {
                            name: shortname(name).to_string(),
                            field_type,
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(Self::Record { fields })
            }
            "enum" => {
                let symbols = mapping
                    .get("symbols")
                    .and_then(Value::as_sequence)
                    .ok_or_else(|| DummyError::Malformed("enum type without symbols".to_string()))?
                    .iter()
                    .map(|symbol| {
                        symbol
                            .as_str()
                            .map(|s| shortname(s).to_string())
                            .ok_or_else(|| DummyError::Malformed("enum symbol is not a string".to_string()))
                    })
                    .collect::<Result<Vec<_>>>()?;
                if symbols.is_empty() {
                    return Err(DummyError::Malformed("enum type with no symbols".to_string()));
                }
                Ok(Self::Enum { symbols })
            }
            other => Err(DummyError::schema(other)),
        }
    }

    /// Wraps `inner` as optional without ever nesting optionals.
    pub fn optional(inner: CwlType) -> Self {
        match inner {
            already @ Self::Optional(_) => already,
            other => Self::Optional(Box::new(other)),
        }
    }

    /// Returns every leaf type (scalars, files, directories, enums) in
    /// declaration order.
    pub fn leaves(&self) -> Vec<&CwlType> {
        let mut leaves = Vec::new();
        self.collect_leaves(&mut leaves);
        leaves
    }

    fn collect_leaves<'a>(&'a self, leaves: &mut Vec<&'a CwlType>) {
        match self {
            Self::Scalar(_) | Self::File | Self::Directory | Self::Enum { .. } => leaves.push(self),
            Self::Array(item) | Self::Optional(item) => item.collect_leaves(leaves),
            Self::Record { fields } => {
                for field in fields {
                    field.field_type.collect_leaves(leaves);
                }
            }
            Self::Union(alternatives) => {
                for alternative in alternatives {
                    alternative.collect_leaves(leaves);
                }
            }
        }
    }

    /// True if a `File` appears anywhere inside this type.
    pub fn reaches_file(&self) -> bool {
        self.leaves().into_iter().any(|leaf| *leaf == Self::File)
    }

    /// True if a `Directory` appears anywhere inside this type.
    pub fn reaches_directory(&self) -> bool {
        self.leaves().into_iter().any(|leaf| *leaf == Self::Directory)
    }

    /// True for outputs the fabrication driver has to create on disk.
    pub fn is_filesystem(&self) -> bool {
        self.reaches_file() || self.reaches_directory()
    }
}

impl fmt::Display for CwlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(kind) => write!(f, "{}", kind.tag()),
            Self::File => write!(f, "File"),
            Self::Directory => write!(f, "Directory"),
            Self::Enum { symbols } => write!(f, "enum({})", symbols.join("|")),
            Self::Array(item) => write!(f, "{}[]", item),
            Self::Record { fields } => {
                let rendered: Vec<String> = fields
                    .iter()
                    .map(|field| format!("{}: {}", field.name, field.field_type))
                    .collect();
                write!(f, "record{{{}}}", rendered.join(", "))
            }
            Self::Union(alternatives) => {
                let rendered: Vec<String> = alternatives.iter().map(|a| a.to_string()).collect();
                write!(f, "({})", rendered.join(" | "))
            }
            Self::Optional(inner) => write!(f, "{}?", inner),
        }
    }
}
