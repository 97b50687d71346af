//! Dummy Value Synthesis
//!
//! Maps a [`CwlType`] to a placeholder literal of the right shape. The
//! mapping is pure and deterministic: equal types always give equal values.
//! File and directory values only *name* what must exist; creating them is
//! left to the fabrication driver at execution time.

use std::fmt;

use serde_json::json;

use crate::schema::{CwlType, ScalarKind};

/// Literal used for every `string`.
pub const DUMMY_STRING: &str = "abc";

/// Name given to synthesized files.
pub const DUMMY_FILE_NAME: &str = "dummy.file";

/// Name given to synthesized directories.
pub const DUMMY_DIRECTORY_NAME: &str = "dummy.dir";

/// A placeholder value.
#[derive(Debug, Clone, PartialEq)]
pub enum DummyValue {
    String(String),
    Int(i64),
    Float(f64),
    Boolean(bool),
    File(String),
    Directory(String),
    Array(Vec<DummyValue>),
    Record(Vec<(String, DummyValue)>),
}

impl DummyValue {
    /// Renders the value as a JSON literal.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::String(s) => json!(s),
            Self::Int(i) => json!(i),
            Self::Float(f) => json!(f),
            Self::Boolean(b) => json!(b),
            Self::File(path) => json!({ "class": "File", "path": path }),
            Self::Directory(path) => json!({ "class": "Directory", "path": path }),
            Self::Array(items) => serde_json::Value::Array(items.iter().map(Self::to_json).collect()),
            Self::Record(fields) => serde_json::Value::Object(
                fields
                    .iter()
                    .map(|(name, value)| (name.clone(), value.to_json()))
                    .collect(),
            ),
        }
    }
}

/// Filesystem work the driver has to do for a value to exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SideEffect {
    CreateFile(String),
    CreateDirectory(String),
}

/// A synthesis choice that is structurally valid but may be semantically
/// wrong for some consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Approximation {
    UnionTieBreak { chosen: String, alternatives: usize },
    OptionalAlwaysPresent { inner: String },
    ArraySingleton { item: String },
}

impl fmt::Display for Approximation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnionTieBreak { chosen, alternatives } => write!(
                f,
                "union of {} alternatives resolved to the first ({}); consumers expecting another alternative get a wrong value",
                alternatives, chosen
            ),
            Self::OptionalAlwaysPresent { inner } => write!(
                f,
                "optional {} is always supplied; the absent case is never exercised",
                inner
            ),
            Self::ArraySingleton { item } => {
                write!(f, "array of {} always holds exactly one element", item)
            }
        }
    }
}

/// Result of synthesizing one type.
#[derive(Debug, Clone, PartialEq)]
pub struct Synthesis {
    pub value: DummyValue,
    pub effects: Vec<SideEffect>,
    pub approximations: Vec<Approximation>,
}

/// Synthesizes a placeholder for `ty`.
///
/// # Example
///
/// ```
/// use cwl_dummy::schema::CwlType;
/// use cwl_dummy::synth::{synthesize, DummyValue};
///
/// let ty = CwlType::Array(Box::new(CwlType::Enum { symbols: vec!["fast".into(), "slow".into()] }));
/// let synthesis = synthesize(&ty);
/// assert_eq!(synthesis.value, DummyValue::Array(vec![DummyValue::String("fast".into())]));
/// ```
pub fn synthesize(ty: &CwlType) -> Synthesis {
    let mut effects = Vec::new();
    let mut approximations = Vec::new();
    let value = synthesize_into(ty, &mut effects, &mut approximations);
    Synthesis {
        value,
        effects,
        approximations,
    }
}

fn synthesize_into(
    ty: &CwlType,
    effects: &mut Vec<SideEffect>,
    approximations: &mut Vec<Approximation>,
) -> DummyValue {
    match ty {
        CwlType::Scalar(kind) => match kind {
            ScalarKind::String => DummyValue::String(DUMMY_STRING.to_string()),
            ScalarKind::Int | ScalarKind::Long => DummyValue::Int(0),
            ScalarKind::Float | ScalarKind::Double => DummyValue::Float(0.0),
            ScalarKind::Boolean => DummyValue::Boolean(false),
        },
        CwlType::File => {
            effects.push(SideEffect::CreateFile(DUMMY_FILE_NAME.to_string()));
            DummyValue::File(DUMMY_FILE_NAME.to_string())
        }
        CwlType::Directory => {
            effects.push(SideEffect::CreateDirectory(DUMMY_DIRECTORY_NAME.to_string()));
            DummyValue::Directory(DUMMY_DIRECTORY_NAME.to_string())
        }
        // Parsing guarantees at least one symbol.
        CwlType::Enum { symbols } => DummyValue::String(symbols.first().cloned().unwrap_or_default()),
        CwlType::Array(item) => {
            approximations.push(Approximation::ArraySingleton {
                item: item.to_string(),
            });
            DummyValue::Array(vec![synthesize_into(item, effects, approximations)])
        }
        CwlType::Record { fields } => DummyValue::Record(
            fields
                .iter()
                .map(|field| {
                    (
                        field.name.clone(),
                        synthesize_into(&field.field_type, effects, approximations),
                    )
                })
                .collect(),
        ),
        CwlType::Union(alternatives) => match alternatives.first() {
            Some(first) => {
                approximations.push(Approximation::UnionTieBreak {
                    chosen: first.to_string(),
                    alternatives: alternatives.len(),
                });
                synthesize_into(first, effects, approximations)
            }
            None => DummyValue::String(DUMMY_STRING.to_string()),
        },
        CwlType::Optional(inner) => {
            approximations.push(Approximation::OptionalAlwaysPresent {
                inner: inner.to_string(),
            });
            synthesize_into(inner, effects, approximations)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::RecordField;

    fn string() -> CwlType {
        CwlType::Scalar(ScalarKind::String)
    }

    #[test]
    fn test_scalars() {
        assert_eq!(synthesize(&string()).value, DummyValue::String("abc".to_string()));
        assert_eq!(synthesize(&CwlType::Scalar(ScalarKind::Long)).value, DummyValue::Int(0));
        assert_eq!(synthesize(&CwlType::Scalar(ScalarKind::Double)).value, DummyValue::Float(0.0));
        assert_eq!(synthesize(&CwlType::Scalar(ScalarKind::Boolean)).value, DummyValue::Boolean(false));

        let synthesis = synthesize(&CwlType::Scalar(ScalarKind::Int));
        assert!(synthesis.effects.is_empty());
        assert!(synthesis.approximations.is_empty());
    }

    #[test]
    fn test_file_and_directory_side_effects() {
        let file = synthesize(&CwlType::File);
        assert_eq!(file.value, DummyValue::File(DUMMY_FILE_NAME.to_string()));
        assert_eq!(file.effects, vec![SideEffect::CreateFile(DUMMY_FILE_NAME.to_string())]);

        let dir = synthesize(&CwlType::Directory);
        assert_eq!(dir.effects, vec![SideEffect::CreateDirectory(DUMMY_DIRECTORY_NAME.to_string())]);
    }

    #[test]
    fn test_enum_takes_first_symbol() {
        let ty = CwlType::Enum {
            symbols: vec!["b".to_string(), "a".to_string()],
        };
        assert_eq!(synthesize(&ty).value, DummyValue::String("b".to_string()));
    }

    #[test]
    fn test_arrays_have_exactly_one_element() {
        let types = [
            CwlType::Array(Box::new(string())),
            CwlType::Array(Box::new(CwlType::File)),
            CwlType::Array(Box::new(CwlType::Array(Box::new(CwlType::Scalar(ScalarKind::Int))))),
            CwlType::Array(Box::new(CwlType::optional(CwlType::Directory))),
        ];
        for ty in &types {
            let DummyValue::Array(items) = synthesize(ty).value else {
                panic!("{} did not synthesize an array", ty);
            };
            assert_eq!(items.len(), 1, "type {}", ty);
        }
    }

    #[test]
    fn test_record_fields_in_order() {
        let ty = CwlType::Record {
            fields: vec![
                RecordField { name: "name".to_string(), field_type: string() },
                RecordField { name: "report".to_string(), field_type: CwlType::File },
            ],
        };
        let synthesis = synthesize(&ty);

        assert_eq!(
            synthesis.value,
            DummyValue::Record(vec![
                ("name".to_string(), DummyValue::String("abc".to_string())),
                ("report".to_string(), DummyValue::File(DUMMY_FILE_NAME.to_string())),
            ])
        );
        assert_eq!(synthesis.effects.len(), 1);
    }

    #[test]
    fn test_union_picks_first_alternative_and_warns() {
        let ty = CwlType::Union(vec![CwlType::File, string()]);
        let synthesis = synthesize(&ty);

        assert_eq!(synthesis.value, DummyValue::File(DUMMY_FILE_NAME.to_string()));
        assert_eq!(
            synthesis.approximations,
            vec![Approximation::UnionTieBreak { chosen: "File".to_string(), alternatives: 2 }]
        );
    }

    #[test]
    fn test_optional_is_always_present() {
        let synthesis = synthesize(&CwlType::optional(string()));
        assert_eq!(synthesis.value, DummyValue::String("abc".to_string()));
        assert!(matches!(
            synthesis.approximations[0],
            Approximation::OptionalAlwaysPresent { .. }
        ));
    }

    #[test]
    fn test_synthesis_is_deterministic() {
        let ty = CwlType::optional(CwlType::Union(vec![
            CwlType::Record {
                fields: vec![RecordField {
                    name: "x".to_string(),
                    field_type: CwlType::Array(Box::new(CwlType::Scalar(ScalarKind::Float))),
                }],
            },
            CwlType::Directory,
        ]));
        assert_eq!(synthesize(&ty), synthesize(&ty.clone()));
    }

    #[test]
    fn test_to_json() {
        let value = DummyValue::Array(vec![DummyValue::Record(vec![
            ("n".to_string(), DummyValue::Int(0)),
            ("f".to_string(), DummyValue::File("x".to_string())),
        ])]);
        assert_eq!(
            value.to_json(),
            json!([{ "n": 0, "f": { "class": "File", "path": "x" } }])
        );
    }

    #[test]
    fn test_approximation_display() {
        let text = Approximation::ArraySingleton { item: "int".to_string() }.to_string();
        assert!(text.contains("exactly one element"));
    }
}
