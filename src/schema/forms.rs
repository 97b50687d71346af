//! Map Form / List Form Normalisation
//!
//! CWL lets `inputs`, `outputs`, `steps`, `requirements` and `hints` be
//! written either as a list of objects or as a mapping keyed by identifier.
//! Everything downstream works on the list form.
//!
//! ```yaml
//! inputs:
//!   my_input: string        # map form, single value
//!   other:                  # map form, object value
//!     type: int
//! ```
//!
//! becomes
//!
//! ```yaml
//! inputs:
//!   - id: my_input
//!     type: string
//!   - id: other
//!     type: int
//! ```

use serde::de::{self, DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_yaml::{Mapping, Value};

/// Converts map form into list form.
///
/// Each `key: value` entry becomes an object carrying `key_key: key`. Object
/// values are merged in, null adds nothing, and any other value is stored
/// under `single_value_key`.
pub fn mapping_to_sequence(mapping: &Mapping, key_key: &str, single_value_key: &str) -> Vec<Value> {
    mapping
        .iter()
        .map(|(key, value)| {
            let mut entry = Mapping::new();
            entry.insert(Value::from(key_key), key.clone());
            match value {
                Value::Mapping(fields) => {
                    for (k, v) in fields {
                        entry.insert(k.clone(), v.clone());
                    }
                }
                Value::Null => {}
                other => {
                    entry.insert(Value::from(single_value_key), other.clone());
                }
            }
            Value::Mapping(entry)
        })
        .collect()
}

/// Returns the list form of a map-or-list node.
pub fn ensure_sequence_form(
    value: Value,
    key_key: &str,
    single_value_key: &str,
) -> Result<Vec<Value>, String> {
    match value {
        Value::Mapping(mapping) => Ok(mapping_to_sequence(&mapping, key_key, single_value_key)),
        Value::Sequence(items) => Ok(items),
        Value::Null => Ok(Vec::new()),
        other => Err(format!(
            "expected a list or a mapping, found {}",
            describe(&other)
        )),
    }
}

/// Wraps a scalar in a one-element list; lists pass through and null is empty.
pub fn ensure_list(value: &Value) -> Vec<Value> {
    match value {
        Value::Null => Vec::new(),
        Value::Sequence(items) => items.clone(),
        other => vec![other.clone()],
    }
}

/// Strips a CWL identifier down to its last path segment.
///
/// `"file.cwl#step/output"` becomes `"output"`, plain names are unchanged.
pub fn shortname(id: &str) -> &str {
    let tail = id.rsplit('#').next().unwrap_or(id);
    tail.rsplit('/').next().unwrap_or(tail)
}

/// Short human description of a node's kind for error messages.
pub fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

fn sequence_form<'de, D, T>(
    deserializer: D,
    key_key: &str,
    single_value_key: &str,
) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    let items = ensure_sequence_form(value, key_key, single_value_key).map_err(de::Error::custom)?;
    items
        .into_iter()
        .map(|item| serde_yaml::from_value(item).map_err(de::Error::custom))
        .collect()
}

/// Deserializes a map-or-list keyed by `id` (parameters, steps).
pub fn id_sequence<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    sequence_form(deserializer, "id", "type")
}

/// Deserializes a map-or-list keyed by `class` (requirements, hints).
pub fn class_sequence<'de, D>(deserializer: D) -> Result<Vec<Mapping>, D::Error>
where
    D: Deserializer<'de>,
{
    sequence_form(deserializer, "class", "class")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(text: &str) -> Value {
        serde_yaml::from_str(text).unwrap()
    }

    #[test]
    fn test_mapping_to_sequence_objects() {
        let value = yaml("my_input: {doc: an input}\nanother_input: {doc: another input}\n");
        let result = ensure_sequence_form(value, "id", "type").unwrap();

        assert_eq!(
            result,
            vec![
                yaml("{id: my_input, doc: an input}"),
                yaml("{id: another_input, doc: another input}"),
            ]
        );
    }

    #[test]
    fn test_mapping_to_sequence_empty() {
        let result = ensure_sequence_form(yaml("{}"), "id", "type").unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_mapping_to_sequence_mixed() {
        let value = yaml("simple_input: string\ninput2: {doc: second input, type: int}\n");
        let result = ensure_sequence_form(value, "id", "type").unwrap();

        assert_eq!(result[0], yaml("{id: simple_input, type: string}"));
        assert_eq!(result[1], yaml("{id: input2, doc: second input, type: int}"));
    }

    #[test]
    fn test_mapping_to_sequence_preserves_order() {
        let value = yaml("zeta: string\nalpha: int\n");
        let result = ensure_sequence_form(value, "id", "type").unwrap();

        assert_eq!(result[0]["id"], Value::from("zeta"));
        assert_eq!(result[1]["id"], Value::from("alpha"));
    }

    #[test]
    fn test_sequence_form_passes_through() {
        let value = yaml("[{id: a, type: int}]");
        let result = ensure_sequence_form(value.clone(), "id", "type").unwrap();
        assert_eq!(Value::Sequence(result), value);
    }

    #[test]
    fn test_sequence_form_rejects_scalar() {
        let result = ensure_sequence_form(Value::from(3), "id", "type");
        assert!(result.unwrap_err().contains("a number"));
    }

    #[test]
    fn test_ensure_list() {
        assert_eq!(ensure_list(&Value::from("a")), vec![Value::from("a")]);
        assert_eq!(ensure_list(&yaml("[a, b]")).len(), 2);
        assert!(ensure_list(&Value::Null).is_empty());
    }

    #[test]
    fn test_shortname() {
        assert_eq!(shortname("main.cwl#step/out"), "out");
        assert_eq!(shortname("#input"), "input");
        assert_eq!(shortname("plain"), "plain");
    }
}
