//! CWL Process Model
//!
//! Typed view of the two process classes this tool rewrites. Fields the
//! converter reads or replaces are typed; everything else lands in an
//! `extra` mapping so emitted documents keep it.
//!
//! # Example YAML Format
//!
//! ```yaml
//! cwlVersion: v1.0
//! class: CommandLineTool
//! baseCommand: [samtools, sort]
//! inputs:
//!   bam:
//!     type: File
//!     inputBinding:
//!       position: 1
//! outputs:
//!   sorted:
//!     type: File
//!     outputBinding:
//!       glob: sorted.bam
//! ```

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use super::forms::{class_sequence, describe, id_sequence};
use super::types::CwlType;
use crate::error::{DummyError, Result};

/// Binding of an input parameter onto the command line.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct InputBinding {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<i64>,

    #[serde(rename = "valueFrom", default, skip_serializing_if = "Option::is_none")]
    pub value_from: Option<Value>,

    #[serde(flatten)]
    pub extra: Mapping,
}

/// How an output parameter is collected after the tool has run.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct OutputBinding {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glob: Option<Value>,

    #[serde(rename = "loadContents", default, skip_serializing_if = "Option::is_none")]
    pub load_contents: Option<bool>,

    #[serde(rename = "outputEval", default, skip_serializing_if = "Option::is_none")]
    pub output_eval: Option<Value>,

    #[serde(flatten)]
    pub extra: Mapping,
}

/// An input or output parameter.
///
/// The `type` node is kept exactly as written; [`Parameter::cwl_type`]
/// parses it on demand.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Parameter {
    pub id: String,

    #[serde(rename = "type", default)]
    pub type_node: Value,

    #[serde(rename = "inputBinding", default, skip_serializing_if = "Option::is_none")]
    pub input_binding: Option<InputBinding>,

    #[serde(rename = "outputBinding", default, skip_serializing_if = "Option::is_none")]
    pub output_binding: Option<OutputBinding>,

    #[serde(flatten)]
    pub extra: Mapping,
}

impl Parameter {
    /// Creates a parameter with a raw type node and no bindings.
    pub fn new(id: impl Into<String>, type_node: impl Into<Value>) -> Self {
        Self {
            id: id.into(),
            type_node: type_node.into(),
            input_binding: None,
            output_binding: None,
            extra: Mapping::new(),
        }
    }

    /// Parses the declared type, naming this parameter on failure.
    pub fn cwl_type(&self) -> Result<CwlType> {
        CwlType::parse(&self.type_node).map_err(|e| e.context(format!("parameter '{}'", self.id)))
    }

    /// Command-line position, if the parameter is bound at all.
    pub fn position(&self) -> Option<i64> {
        self.input_binding.as_ref().map(|b| b.position.unwrap_or(0))
    }
}

/// A `CommandLineTool` document.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CommandLineTool {
    #[serde(rename = "cwlVersion", default, skip_serializing_if = "Option::is_none")]
    pub cwl_version: Option<String>,

    pub class: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, deserialize_with = "class_sequence", skip_serializing_if = "Vec::is_empty")]
    pub requirements: Vec<Mapping>,

    #[serde(default, deserialize_with = "class_sequence", skip_serializing_if = "Vec::is_empty")]
    pub hints: Vec<Mapping>,

    #[serde(rename = "baseCommand", default, skip_serializing_if = "Option::is_none")]
    pub base_command: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Value>,

    #[serde(deserialize_with = "id_sequence")]
    pub inputs: Vec<Parameter>,

    #[serde(deserialize_with = "id_sequence")]
    pub outputs: Vec<Parameter>,

    #[serde(flatten)]
    pub extra: Mapping,
}

impl CommandLineTool {
    /// Creates an empty tool with the given interface.
    pub fn new(inputs: Vec<Parameter>, outputs: Vec<Parameter>) -> Self {
        Self {
            cwl_version: None,
            class: CLASS_TOOL.to_string(),
            id: None,
            requirements: Vec::new(),
            hints: Vec::new(),
            base_command: None,
            arguments: None,
            inputs,
            outputs,
            extra: Mapping::new(),
        }
    }

    /// Finds an input by id.
    pub fn get_input(&self, id: &str) -> Option<&Parameter> {
        self.inputs.iter().find(|p| p.id == id)
    }

    /// Returns true if a requirement of the given class is declared.
    pub fn has_requirement(&self, class: &str) -> bool {
        self.requirements
            .iter()
            .any(|r| r.get("class").and_then(Value::as_str) == Some(class))
    }
}

/// Where a step's process comes from.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum RunReference {
    /// A path relative to the enclosing document.
    Path(String),
    /// An embedded process document.
    Inline(Mapping),
}

/// A single step of a workflow.
///
/// `in` and `out` are kept as raw nodes: the converter never alters the
/// data-flow wiring.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Step {
    pub id: String,

    #[serde(rename = "in", default, skip_serializing_if = "Value::is_null")]
    pub inputs: Value,

    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub out: Value,

    pub run: RunReference,

    #[serde(flatten)]
    pub extra: Mapping,
}

impl Step {
    /// Creates a step running the document at `path`.
    pub fn new(id: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            inputs: Value::Mapping(Mapping::new()),
            out: Value::Sequence(Vec::new()),
            run: RunReference::Path(path.into()),
            extra: Mapping::new(),
        }
    }

    /// Identifiers of the step's inputs, in declaration order.
    pub fn in_ids(&self) -> Vec<String> {
        match &self.inputs {
            Value::Mapping(mapping) => mapping
                .keys()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            Value::Sequence(items) => items.iter().filter_map(entry_id).collect(),
            _ => Vec::new(),
        }
    }

    /// Identifiers of the step's outputs, in declaration order.
    pub fn out_ids(&self) -> Vec<String> {
        match &self.out {
            Value::Sequence(items) => items
                .iter()
                .filter_map(|item| match item {
                    Value::String(id) => Some(id.clone()),
                    other => entry_id(other),
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

fn entry_id(entry: &Value) -> Option<String> {
    entry.get("id").and_then(Value::as_str).map(str::to_string)
}

/// A `Workflow` document.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Workflow {
    #[serde(rename = "cwlVersion", default, skip_serializing_if = "Option::is_none")]
    pub cwl_version: Option<String>,

    pub class: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(deserialize_with = "id_sequence")]
    pub inputs: Vec<Parameter>,

    #[serde(deserialize_with = "id_sequence")]
    pub outputs: Vec<Parameter>,

    #[serde(deserialize_with = "id_sequence")]
    pub steps: Vec<Step>,

    #[serde(flatten)]
    pub extra: Mapping,
}

impl Workflow {
    /// Gets a step by ID.
    pub fn get_step(&self, id: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.id == id)
    }
}

pub const CLASS_TOOL: &str = "CommandLineTool";
pub const CLASS_WORKFLOW: &str = "Workflow";
pub const CLASS_EXPRESSION_TOOL: &str = "ExpressionTool";

/// A loaded process of any supported class.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum Process {
    Tool(CommandLineTool),
    Workflow(Workflow),
    /// `ExpressionTool`s are cheap already and pass through untouched.
    Expression(Mapping),
}

impl Process {
    /// Builds a process from a parsed document node, dispatching on `class`.
    pub fn from_node(node: Mapping) -> Result<Self> {
        let class = match node.get("class") {
            Some(Value::String(class)) => class.clone(),
            Some(other) => {
                return Err(DummyError::Malformed(format!(
                    "'class' must be a string, found {}",
                    describe(other)
                )))
            }
            None => return Err(DummyError::Malformed("document has no 'class'".to_string())),
        };

        let process = match class.as_str() {
            CLASS_TOOL => Self::Tool(from_mapping(node, &class)?),
            CLASS_WORKFLOW => Self::Workflow(from_mapping(node, &class)?),
            CLASS_EXPRESSION_TOOL => Self::Expression(node),
            other => {
                return Err(DummyError::unsupported_construct(format!(
                    "document class '{}'",
                    other
                )))
            }
        };

        process.check_types()?;
        Ok(process)
    }

    /// Parses every declared parameter type, failing on the first bad tag.
    fn check_types(&self) -> Result<()> {
        let (inputs, outputs) = match self {
            Self::Tool(tool) => (&tool.inputs, &tool.outputs),
            Self::Workflow(workflow) => (&workflow.inputs, &workflow.outputs),
            Self::Expression(_) => return Ok(()),
        };
        for param in inputs {
            param.cwl_type().map_err(|e| e.context("input"))?;
        }
        for param in outputs {
            param.cwl_type().map_err(|e| e.context("output"))?;
        }
        Ok(())
    }

    /// The document's `class` string.
    pub fn class(&self) -> &str {
        match self {
            Self::Tool(_) => CLASS_TOOL,
            Self::Workflow(_) => CLASS_WORKFLOW,
            Self::Expression(_) => CLASS_EXPRESSION_TOOL,
        }
    }

    /// Serializes back into a generic node.
    pub fn to_node(&self) -> Result<Mapping> {
        match serde_yaml::to_value(self) {
            Ok(Value::Mapping(mapping)) => Ok(mapping),
            Ok(other) => Err(DummyError::Malformed(format!(
                "process serialized to {}",
                describe(&other)
            ))),
            Err(e) => Err(DummyError::Malformed(format!("failed to serialize process: {}", e))),
        }
    }
}

fn from_mapping<T: serde::de::DeserializeOwned>(node: Mapping, class: &str) -> Result<T> {
    serde_yaml::from_value(Value::Mapping(node))
        .map_err(|e| DummyError::Malformed(format!("invalid {}: {}", class, e)))
}
